//! API error type
//!
//! Maps domain failures to HTTP responses with a JSON error envelope.
//! Validation failures carry the full violation list so a client sees every
//! offending record and field in one response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::import::ImportError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Import saga failure (mapped per variant)
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Database error outside the import saga
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, violations) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            ApiError::Import(ImportError::Parse(e)) => (
                StatusCode::BAD_REQUEST,
                "PARSE_ERROR",
                format!("payload could not be parsed as a movie batch: {e}"),
                None,
            ),
            ApiError::Import(ImportError::Validation(violations)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                self.to_string(),
                Some(serde_json::to_value(violations).unwrap_or_default()),
            ),
            ApiError::Import(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IMPORT_FAILED",
                format!("Import failed: {e}"),
                None,
            ),
            ApiError::Database(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
                None,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
                None,
            ),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });
        if let Some(violations) = violations {
            body["error"]["violations"] = violations;
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
