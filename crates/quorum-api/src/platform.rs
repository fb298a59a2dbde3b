use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quorum_types::api::{
    Claims, CreatePlatformMessageRequest, CreatePlatformMessageResponse,
    SetPlatformMessageActiveRequest,
};
use quorum_types::models::PlatformMessage;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_admin;
use crate::{blocking, parse_timestamp, parse_uuid};

/// Active broadcast banners, shown to everyone. Public.
pub async fn list_platform_messages(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.active_platform_messages().map_err(ApiError::from)).await?;

    let messages: Vec<PlatformMessage> = rows
        .into_iter()
        .map(|row| PlatformMessage {
            id: parse_uuid(&row.id, "platform message"),
            message: row.message,
            active: row.active,
            created_at: parse_timestamp(&row.created_at, "platform message"),
        })
        .collect();

    Ok(Json(messages))
}

pub async fn create_platform_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePlatformMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    if req.message.trim().is_empty() {
        return Err(ApiError::InvalidInput("message is required".into()));
    }

    let message_id = Uuid::new_v4();
    let db = state.clone();
    blocking(move || {
        db.db
            .create_platform_message(&message_id.to_string(), &req.message)
            .map_err(ApiError::from)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePlatformMessageResponse { id: message_id }),
    ))
}

pub async fn set_platform_message_active(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetPlatformMessageActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let mid = message_id.to_string();
    blocking(move || {
        db.db
            .set_platform_message_active(&mid, req.active)
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(serde_json::json!({ "active": req.active })))
}

pub async fn delete_platform_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let mid = message_id.to_string();
    blocking(move || db.db.delete_platform_message(&mid).map_err(ApiError::from)).await?;

    Ok(StatusCode::NO_CONTENT)
}
