use crate::error::StorageError;
use crate::token::Token;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A persisted mapping between a full URL and its token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The token issued for the URL.
    pub token: Token,
    /// The original URL, returned byte for byte as it was saved.
    pub full_url: String,
    /// When the record was first saved.
    pub created_at: Timestamp,
}

/// Durable mapping between full URLs and tokens.
///
/// Implementations must keep both directions functional: a token maps to at
/// most one URL and a URL to at most one token. Reads may run concurrently
/// with each other and with [`Storage::save`].
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Looks up the record for a token.
    /// Returns `None` if the token was never saved.
    async fn resolve(&self, token: &Token) -> Result<Option<UrlRecord>>;

    /// Looks up the token already issued for this exact URL, if any.
    async fn find_token(&self, full_url: &str) -> Result<Option<Token>>;

    /// Persists a new pair.
    ///
    /// Returns `Err(TokenConflict)` if the token is taken and
    /// `Err(UrlConflict)` if the URL already has a token. Nothing is written
    /// in either case.
    async fn save(&self, full_url: &str, token: &Token) -> Result<()>;

    /// Releases backend resources such as connection pools.
    async fn close(&self) -> Result<()>;
}
