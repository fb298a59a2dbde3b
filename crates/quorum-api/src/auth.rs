use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use quorum_db::{Database, models::UserRow};
use quorum_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use quorum_types::models::User;

use crate::error::ApiError;
use crate::{blocking, parse_timestamp, parse_uuid};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::InvalidInput(
            "username must be 3-32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::InvalidInput(
            "password must be at least 8 characters".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::InvalidInput("email is not valid".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hash: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    let db = state.clone();
    let row = blocking(move || {
        if db.db.get_user_by_username(&req.username)?.is_some() {
            return Err(ApiError::Conflict("username already taken".into()));
        }
        if db.db.get_user_by_email(&req.email)?.is_some() {
            return Err(ApiError::Conflict("email already registered".into()));
        }
        db.db.create_user(
            &user_id.to_string(),
            &req.username,
            &req.email,
            &password_hash,
            "user",
        )?;
        db.db
            .get_user_by_id(&user_id.to_string())?
            .ok_or(ApiError::NotFound("user"))
    })
    .await?;

    let token = create_token(&state.jwt_secret, &row)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: to_user(row),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let row = blocking(move || db.db.get_user_by_username(&username).map_err(ApiError::from))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Banned accounts cannot sign in.
    if row.banned {
        return Err(ApiError::Unauthorized);
    }

    // Verify password
    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let token = create_token(&state.jwt_secret, &row)?;

    Ok(Json(AuthResponse {
        token,
        user: to_user(row),
    }))
}

/// Make sure the admin account exists. Called once at startup.
pub fn ensure_admin(db: &Database, password: &str) -> anyhow::Result<()> {
    if db.get_user_by_username("admin")?.is_some() {
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hash: {}", e))?
        .to_string();

    db.create_user(
        &Uuid::new_v4().to_string(),
        "admin",
        "admin@quorum.local",
        &password_hash,
        "admin",
    )?;
    info!("Seeded admin user");
    Ok(())
}

pub(crate) fn to_user(row: UserRow) -> User {
    User {
        id: parse_uuid(&row.id, "user"),
        username: row.username,
        email: row.email,
        role: row.role,
        banned: row.banned,
        created_at: parse_timestamp(&row.created_at, "user"),
    }
}

fn create_token(secret: &str, user: &UserRow) -> Result<String, ApiError> {
    let claims = Claims {
        sub: parse_uuid(&user.id, "user"),
        username: user.username.clone(),
        role: user.role.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn issued_tokens_round_trip() {
        let row = UserRow {
            id: Uuid::new_v4().to_string(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "hash".into(),
            role: "user".into(),
            banned: false,
            created_at: "2026-01-01 00:00:00".into(),
        };

        let token = create_token("test-secret", &row).unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub.to_string(), row.id);
        assert_eq!(decoded.claims.username, "alice");
        assert_eq!(decoded.claims.role, "user");
    }
}
