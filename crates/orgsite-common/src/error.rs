//! Error types shared across orgsite crates

use thiserror::Error;

/// Result type alias for orgsite operations
pub type Result<T> = std::result::Result<T, OrgsiteError>;

/// Main error type for orgsite
#[derive(Error, Debug)]
pub enum OrgsiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
