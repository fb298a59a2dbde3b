use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use quorum_types::api::{BanRequest, Claims};
use quorum_types::models::User;

use crate::auth::{AppState, to_user};
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::require_admin;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let rows = blocking(move || db.db.list_users().map_err(ApiError::from)).await?;

    let users: Vec<User> = rows.into_iter().map(to_user).collect();
    Ok(Json(users))
}

pub async fn ban_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let uid = user_id.to_string();
    let banned = req.banned;
    blocking(move || db.db.set_user_banned(&uid, banned).map_err(ApiError::from)).await?;

    Ok(Json(serde_json::json!({ "banned": banned })))
}
