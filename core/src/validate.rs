//! Header name and value validation.
//!
//! Names are lower-cased before validation; values are trimmed of
//! surrounding whitespace before validation. Both checks are pure so
//! `Headers` can run them before touching its storage.

use crate::error::FetchError;

/// Returns true for characters allowed in an HTTP token (RFC 7230 `tchar`).
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

/// Returns true for characters allowed in a header value: tab and the
/// printable Latin-1 ranges.
pub fn is_value_char(c: char) -> bool {
    matches!(c, '\t' | ' '..='~' | '\u{80}'..='\u{ff}')
}

/// Fails unless `name` is a non-empty token. Case is left untouched.
pub fn validate_name(name: &str) -> Result<(), FetchError> {
    if name.is_empty() || !name.chars().all(is_token_char) {
        return Err(FetchError::InvalidHeaderName(name.to_string()));
    }
    Ok(())
}

/// Fails if `value` is empty or contains a character outside tab and
/// printable Latin-1. Expects an already trimmed value.
pub fn validate_value(name: &str, value: &str) -> Result<(), FetchError> {
    if value.is_empty() || !value.chars().all(is_value_char) {
        return Err(FetchError::InvalidHeaderValue {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Strips leading and trailing spaces, tabs, CR and LF.
pub fn normalize_value(value: &str) -> &str {
    value.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

pub fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Lower-cases and validates a header name.
pub fn normalize_and_validate_name(name: &str) -> Result<String, FetchError> {
    let name = normalize_name(name);
    validate_name(&name)?;
    Ok(name)
}

/// Normalizes and validates a name/value pair in one step.
pub fn normalize_and_validate(name: &str, value: &str) -> Result<(String, String), FetchError> {
    let name = normalize_and_validate_name(name)?;
    let value = normalize_value(value);
    validate_value(&name, value)?;
    Ok((name, value.to_string()))
}
