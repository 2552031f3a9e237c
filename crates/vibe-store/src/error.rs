//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document or blob id is malformed.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Documents must be JSON objects.
    #[error("document for collection '{0}' is not a JSON object")]
    NotAnObject(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
