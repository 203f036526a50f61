use crate::{Generator, GeneratorError};
use rand::rngs::OsRng;
use rand::TryRngCore;
use shrinkray_core::token::{ALPHABET, TOKEN_LENGTH};
use shrinkray_core::Token;

/// Six random bits per draw; draws at or above the alphabet size are rejected
/// so every symbol stays equally likely.
const DRAW_MASK: u8 = 0b0011_1111;

/// Bytes requested from the entropy source per refill.
const BATCH_SIZE: usize = 16;

/// A source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync + 'static {
    fn fill(&self, buf: &mut [u8]) -> Result<(), GeneratorError>;
}

/// Entropy drawn from the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), GeneratorError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| GeneratorError::Entropy(e.to_string()))
    }
}

/// Generates tokens whose characters are drawn independently and uniformly
/// from [`ALPHABET`].
#[derive(Debug, Default, Clone)]
pub struct RandomGenerator<E = OsEntropy> {
    entropy: E,
}

impl RandomGenerator<OsEntropy> {
    /// Creates a generator backed by the operating system CSPRNG.
    pub fn new() -> Self {
        Self { entropy: OsEntropy }
    }
}

impl<E: EntropySource> RandomGenerator<E> {
    /// Creates a generator backed by a custom entropy source.
    pub fn with_entropy(entropy: E) -> Self {
        Self { entropy }
    }
}

impl<E: EntropySource> Generator for RandomGenerator<E> {
    fn generate(&self) -> Result<Token, GeneratorError> {
        let mut token = String::with_capacity(TOKEN_LENGTH);
        let mut buf = [0u8; BATCH_SIZE];

        while token.len() < TOKEN_LENGTH {
            self.entropy.fill(&mut buf)?;
            for byte in buf {
                let index = usize::from(byte & DRAW_MASK);
                if index >= ALPHABET.len() {
                    continue;
                }
                token.push(char::from(ALPHABET[index]));
                if token.len() == TOKEN_LENGTH {
                    break;
                }
            }
        }

        Ok(Token::new_unchecked(token))
    }
}
