pub mod random;

pub use random::{EntropySource, OsEntropy, RandomGenerator};

use shrinkray_core::{ShortenerError, Token};
use thiserror::Error;

/// Errors raised while producing a token.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    /// The underlying entropy source failed. Retrying is not expected to help.
    #[error("entropy source failed: {0}")]
    Entropy(String),
}

impl From<GeneratorError> for ShortenerError {
    fn from(value: GeneratorError) -> Self {
        match value {
            GeneratorError::Entropy(message) => ShortenerError::Entropy(message),
        }
    }
}

/// Trait for generating candidate tokens.
///
/// Implementations are pure generators that don't interact with storage;
/// uniqueness is checked by the caller.
pub trait Generator: Send + Sync + 'static {
    /// Generates a new candidate token.
    fn generate(&self) -> Result<Token, GeneratorError>;
}
