use axum::{Extension, Json, extract::State, response::IntoResponse};

use quorum_db::{ContentType, VoteDirection};
use quorum_types::api::{CastVoteRequest, CastVoteResponse, Claims};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

pub async fn cast_vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = ContentType::parse(&req.content_type)?;
    let direction = VoteDirection::parse(&req.direction)?;

    let db = state.clone();
    let user_id = claims.sub.to_string();
    let content_id = req.content_id.to_string();
    let total = blocking(move || {
        db.db
            .cast_vote(&user_id, content_type, &content_id, direction)
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(CastVoteResponse { total }))
}
