use crate::storage::UrlRecord;
use crate::token::Token;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Outcome of a successful shortening request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    /// The token now mapped to the URL.
    pub token: Token,
    /// `true` if this call issued the token, `false` if it already existed.
    pub created: bool,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the token for `full_url`, issuing a new one on first use.
    ///
    /// Repeated calls with the same URL always yield the same token.
    async fn shorten(&self, full_url: &str) -> Result<Shortened>;

    /// Resolves a token to its stored record.
    /// Fails with `NotFound` if the token was never issued.
    async fn resolve(&self, token: &str) -> Result<UrlRecord>;
}
