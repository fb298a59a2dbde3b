use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

// -- JWT Claims --

/// JWT claims shared between token issuance (register/login) and the REST
/// auth middleware. Canonical definition lives here in quorum-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// -- Questions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateQuestionRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateQuestionResponse {
    pub id: Uuid,
}

// -- Answers --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAnswerRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreateAnswerResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AcceptAnswerResponse {
    pub accepted: bool,
}

// -- Votes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastVoteRequest {
    pub content_type: String,
    pub content_id: Uuid,
    pub direction: String,
}

#[derive(Debug, Serialize)]
pub struct CastVoteResponse {
    pub total: i64,
}

// -- Admin --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BanRequest {
    pub banned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePlatformMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePlatformMessageResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPlatformMessageActiveRequest {
    pub active: bool,
}
