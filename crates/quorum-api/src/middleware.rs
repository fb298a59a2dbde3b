use axum::{extract::Request, http::header, middleware::Next, response::Response};
use jsonwebtoken::{DecodingKey, Validation, decode};

use quorum_types::api::Claims;

use crate::error::ApiError;

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let secret =
        std::env::var("QUORUM_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Moderation endpoints are gated on the role claim.
pub fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.role != "admin" {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn non_admin_claims_are_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "alice".into(),
            role: "user".into(),
            exp: 0,
        };
        assert!(require_admin(&claims).is_err());

        let admin = Claims {
            role: "admin".into(),
            ..claims
        };
        assert!(require_admin(&admin).is_ok());
    }
}
