use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use quorum_db::StoreError;

/// Request-boundary error. Every failure a handler can hit maps onto one of
/// these and renders as `{"error": "..."}` with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("not authorized")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidContentType(_)
            | StoreError::InvalidDirection(_)
            | StoreError::InvalidSort(_) => Self::InvalidInput(err.to_string()),
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Forbidden => Self::Forbidden,
            StoreError::Sqlite(_) | StoreError::LockPoisoned => {
                Self::Internal(anyhow::Error::new(err))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(err) => {
                // Log the cause, never leak it.
                tracing::error!("internal error: {:#}", err);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_the_right_status() {
        let cases = [
            (
                ApiError::from(StoreError::InvalidDirection("sideways".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(StoreError::NotFound("answer")),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::from(StoreError::Forbidden), StatusCode::FORBIDDEN),
            (
                ApiError::from(StoreError::LockPoisoned),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ApiError::Internal(anyhow::anyhow!("secret database path"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
