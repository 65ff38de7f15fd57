//! Error types for the web interface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::ErrorKind;
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum WebError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Session store error.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::Database(err) => {
                let status = match err.kind() {
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                    ErrorKind::Invalid => StatusCode::BAD_REQUEST,
                    ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
                };
                tracing::error!(kind = ?err.kind(), "Database error: {}", err);
                (status, err.to_string())
            }
            WebError::Session(err) => {
                tracing::error!("Session error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "session unavailable".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for request handlers.
pub type Result<T> = std::result::Result<T, WebError>;
