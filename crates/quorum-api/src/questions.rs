use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use quorum_db::models::QuestionRow;
use quorum_db::queries::{QuestionFilter, QuestionSort};
use quorum_types::api::{Claims, CreateQuestionRequest, CreateQuestionResponse};
use quorum_types::models::Question;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, parse_timestamp, parse_uuid};

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    pub search: Option<String>,
    /// Comma-separated tag names, e.g. `?tags=rust,testing`.
    pub tags: Option<String>,
    #[serde(default = "default_sort")]
    pub sort: String,
}

fn default_sort() -> String {
    "newest".into()
}

pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<QuestionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sort = QuestionSort::parse(&query.sort)?;
    let tags: Vec<String> = query
        .tags
        .map(|raw| {
            raw.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let filter = QuestionFilter {
        search: query.search,
        tags,
        sort,
    };

    let db = state.clone();
    let (rows, tag_rows) = blocking(move || {
        let rows = db.db.list_questions(&filter)?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let tag_rows = db.db.tags_for_questions(&ids)?;
        Ok((rows, tag_rows))
    })
    .await?;

    // Group tag names by question_id (cheap in-memory work, fine on the async thread)
    let mut tag_map: HashMap<String, Vec<String>> = HashMap::new();
    for row in tag_rows {
        tag_map.entry(row.question_id).or_default().push(row.name);
    }

    let questions: Vec<Question> = rows
        .into_iter()
        .map(|row| {
            let tags = tag_map.remove(&row.id).unwrap_or_default();
            to_question(row, tags)
        })
        .collect();

    Ok(Json(questions))
}

pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let qid = question_id.to_string();
    let (row, tag_rows) = blocking(move || {
        let row = db
            .db
            .get_question(&qid)?
            .ok_or(ApiError::NotFound("question"))?;
        let tag_rows = db.db.tags_for_questions(std::slice::from_ref(&row.id))?;
        Ok((row, tag_rows))
    })
    .await?;

    let tags = tag_rows.into_iter().map(|t| t.name).collect();
    Ok(Json(to_question(row, tags)))
}

pub async fn create_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "title and description are required".into(),
        ));
    }

    let question_id = Uuid::new_v4();
    let db = state.clone();
    let author_id = claims.sub.to_string();
    blocking(move || {
        db.db
            .create_question(
                &question_id.to_string(),
                &req.title,
                &req.description,
                &author_id,
                &req.tags,
            )
            .map_err(ApiError::from)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateQuestionResponse { id: question_id }),
    ))
}

pub(crate) fn to_question(row: QuestionRow, tags: Vec<String>) -> Question {
    Question {
        id: parse_uuid(&row.id, "question"),
        title: row.title,
        description: row.description,
        author_id: parse_uuid(&row.author_id, "question author"),
        author_username: row.author_username,
        votes: row.votes,
        tags,
        created_at: parse_timestamp(&row.created_at, "question"),
    }
}
