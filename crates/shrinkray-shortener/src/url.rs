use shrinkray_core::ShortenerError;
use url::Url;

/// Checks that `raw` is a well-formed absolute, hierarchical URI.
///
/// The string is validated as given: surrounding whitespace is rejected
/// rather than trimmed, since the stored URL must be returned unchanged.
pub fn validate_url(raw: &str) -> Result<(), ShortenerError> {
    if raw.is_empty() {
        return Err(ShortenerError::InvalidInput(
            "URL cannot be empty".to_string(),
        ));
    }

    if raw.trim() != raw {
        return Err(ShortenerError::InvalidInput(format!(
            "URL must not have surrounding whitespace: {raw:?}"
        )));
    }

    // the parser strips tabs and newlines, so they would survive into the
    // stored URL unnoticed
    if raw.chars().any(char::is_control) {
        return Err(ShortenerError::InvalidInput(format!(
            "URL must not contain control characters: {raw:?}"
        )));
    }

    let parsed = Url::parse(raw)
        .map_err(|e| ShortenerError::InvalidInput(format!("{raw:?}: {e}")))?;

    if parsed.cannot_be_a_base() {
        return Err(ShortenerError::InvalidInput(format!(
            "URL must be hierarchical: {raw:?}"
        )));
    }

    Ok(())
}
