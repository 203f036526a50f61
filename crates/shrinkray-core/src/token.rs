use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// Number of characters in every issued token.
pub const TOKEN_LENGTH: usize = 10;

/// Symbols a token may be built from.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidToken {
    #[error("token must be {TOKEN_LENGTH} characters long, got {0}")]
    Length(usize),
    #[error("token contains a character outside [A-Za-z0-9_]: '{0}'")]
    Character(String),
}

/// A short identifier standing in for a full URL.
///
/// Tokens are exactly [`TOKEN_LENGTH`] characters drawn from [`ALPHABET`].
/// They carry no information about the URL they map to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Parses and validates a token received from an untrusted source.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidToken> {
        let raw = raw.into();
        Self::validate(&raw)?;
        Ok(Self(raw))
    }

    /// Creates a `Token` without validation.
    ///
    /// Use this only for trusted producers such as the token generator or
    /// values read back from storage.
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }

    fn validate(raw: &str) -> Result<(), InvalidToken> {
        if raw.len() != TOKEN_LENGTH {
            return Err(InvalidToken::Length(raw.len()));
        }

        if !raw.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(InvalidToken::Character(raw.to_owned()));
        }

        Ok(())
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Token::parse(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_has_no_duplicates() {
        let mut seen = ALPHABET.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), ALPHABET.len());
        assert_eq!(ALPHABET.len(), 63);
    }

    #[test]
    fn valid_tokens() {
        assert!(Token::parse("abcdefghij").is_ok());
        assert!(Token::parse("A_b9Z0x_1Q").is_ok());
        assert!(Token::parse("__________").is_ok());
    }

    #[test]
    fn wrong_length() {
        assert_eq!(Token::parse("abc"), Err(InvalidToken::Length(3)));
        assert_eq!(Token::parse(""), Err(InvalidToken::Length(0)));
        assert_eq!(Token::parse("a".repeat(11)), Err(InvalidToken::Length(11)));
    }

    #[test]
    fn invalid_characters() {
        assert!(matches!(
            Token::parse("abc-defghi"),
            Err(InvalidToken::Character(_))
        ));
        assert!(matches!(
            Token::parse("abc/defghi"),
            Err(InvalidToken::Character(_))
        ));
        // multi-byte characters change the byte length, so pad to 10 bytes
        assert!(Token::parse("abcdefgh\u{e9}").is_err());
    }

    #[test]
    fn display_matches_raw() {
        let token = Token::parse("zzzzzzzzzz").unwrap();
        assert_eq!(token.to_string(), "zzzzzzzzzz");
        assert_eq!(token.as_str(), "zzzzzzzzzz");
    }

    #[test]
    fn deserialize_validates() {
        let token: Token = serde_json::from_str("\"abcdefghij\"").unwrap();
        assert_eq!(token.as_str(), "abcdefghij");

        let err = serde_json::from_str::<Token>("\"short\"");
        assert!(err.is_err());
    }
}
