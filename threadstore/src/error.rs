//! Store error types

use thiserror::Error;

/// Errors raised by checkpoint adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid thread id: {0}")]
    InvalidThreadId(String),
}
