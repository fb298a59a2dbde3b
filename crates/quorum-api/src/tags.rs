use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let tags = blocking(move || db.db.list_tags().map_err(ApiError::from)).await?;
    Ok(Json(tags))
}
