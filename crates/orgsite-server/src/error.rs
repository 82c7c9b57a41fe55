//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for handler-level operations
pub type ServerResult<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Orgsite error: {0}")]
    Orgsite(#[from] orgsite_common::OrgsiteError),

    #[error("Audit error: {0}")]
    Audit(#[from] crate::audit::AuditError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            },
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                message.clone()
            },
            AppError::Config(ref message) => {
                tracing::error!("Configuration error: {}", message);
                "Server configuration error".to_string()
            },
            AppError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                "An IO error occurred".to_string()
            },
            AppError::Orgsite(ref e) => {
                tracing::error!("Orgsite error: {:?}", e);
                e.to_string()
            },
            AppError::Audit(ref e) => {
                tracing::error!("Audit error: {:?}", e);
                "Failed to read the audit log".to_string()
            },
            AppError::NotFound(message)
            | AppError::Validation(message)
            | AppError::Unauthorized(message)
            | AppError::BadRequest(message) => message,
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
