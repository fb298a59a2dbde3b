use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use quorum_db::models::AnswerRow;
use quorum_types::api::{
    AcceptAnswerResponse, Claims, CreateAnswerRequest, CreateAnswerResponse,
};
use quorum_types::models::Answer;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, parse_timestamp, parse_uuid};

pub async fn list_answers(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let qid = question_id.to_string();
    let rows = blocking(move || db.db.list_answers(&qid).map_err(ApiError::from)).await?;

    let answers: Vec<Answer> = rows.into_iter().map(to_answer).collect();
    Ok(Json(answers))
}

pub async fn create_answer(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::InvalidInput("content is required".into()));
    }

    let answer_id = Uuid::new_v4();
    let db = state.clone();
    let qid = question_id.to_string();
    let author_id = claims.sub.to_string();
    blocking(move || {
        let aid = answer_id.to_string();
        db.db.create_answer(&aid, &qid, &author_id, &req.content)?;

        // Best-effort: a notification failure never fails the answer itself.
        if let Err(err) = db.db.notify_answer_created(&aid) {
            warn!("failed to record answer notification: {}", err);
        }
        Ok(())
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAnswerResponse { id: answer_id }),
    ))
}

pub async fn accept_answer(
    State(state): State<AppState>,
    Path(answer_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let aid = answer_id.to_string();
    let user_id = claims.sub.to_string();
    blocking(move || db.db.accept_answer(&aid, &user_id).map_err(ApiError::from)).await?;

    Ok(Json(AcceptAnswerResponse { accepted: true }))
}

pub(crate) fn to_answer(row: AnswerRow) -> Answer {
    Answer {
        id: parse_uuid(&row.id, "answer"),
        question_id: parse_uuid(&row.question_id, "answer question"),
        author_id: parse_uuid(&row.author_id, "answer author"),
        author_username: row.author_username,
        content: row.content,
        votes: row.votes,
        accepted: row.accepted,
        created_at: parse_timestamp(&row.created_at, "answer"),
    }
}
