use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The `code` in the response body is the machine-readable kind the web
/// client switches on. Everything after the colon in the log lines stays
/// server-side.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "unauthenticated",
            AppError::InvalidArgument(_) => "invalid-argument",
            AppError::FailedPrecondition(_) => "failed-precondition",
            AppError::NotFound(_) => "not-found",
            AppError::Database(_) | AppError::Llm(_) | AppError::S3(_) | AppError::Internal(_) => {
                "internal"
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "You must be logged in.".to_string(),
            ),
            AppError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::FailedPrecondition(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                // The message is already caller-safe; provider detail was logged where it occurred.
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
