use std::time::Duration;
use thiserror::Error;

/// Errors reported by a [`Storage`](crate::Storage) backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("token already exists: {0}")]
    TokenConflict(String),
    #[error("url already has a token: {0}")]
    UrlConflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors returned by the shortening protocol.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidInput(String),
    #[error("token not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("operation exceeded its deadline of {0:?}")]
    Timeout(Duration),
    #[error("no free token found after {0} attempts")]
    TooManyCollisions(u32),
    #[error("token generator failed: {0}")]
    Entropy(String),
}
