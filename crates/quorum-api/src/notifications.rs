use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use quorum_types::api::Claims;
use quorum_types::models::Notification;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, parse_timestamp, parse_uuid};

/// Most recent notifications shown to a user.
const NOTIFICATION_LIMIT: u32 = 50;

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();
    let rows = blocking(move || {
        db.db
            .notifications_for_user(&user_id, NOTIFICATION_LIMIT)
            .map_err(ApiError::from)
    })
    .await?;

    let notifications: Vec<Notification> = rows
        .into_iter()
        .map(|row| Notification {
            id: parse_uuid(&row.id, "notification"),
            kind: row.kind,
            message: row.message,
            read: row.read,
            question_id: row.question_id.map(|id| parse_uuid(&id, "notification question")),
            answer_id: row.answer_id.map(|id| parse_uuid(&id, "notification answer")),
            created_at: parse_timestamp(&row.created_at, "notification"),
        })
        .collect();

    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let nid = notification_id.to_string();
    let user_id = claims.sub.to_string();
    blocking(move || {
        db.db
            .mark_notification_read(&nid, &user_id)
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(serde_json::json!({ "read": true })))
}
