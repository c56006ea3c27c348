//! Input validation shared by the domain actions.
//!
//! Every helper trims its input and returns the cleaned value, so callers
//! store exactly what was validated.

use thiserror::Error;
use url::Url;

/// A request field failed validation. Surfaces as 400.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Require a non-blank string of at most `max_chars` characters.
pub fn required_text(field: &str, value: Option<&str>, max_chars: usize) -> ValidationResult<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{} is required", field)));
    }
    check_length(field, trimmed, max_chars)?;
    Ok(trimmed.to_string())
}

/// Blank strings collapse to `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            check_length(field, trimmed, max_chars)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Lower-cased, trimmed email with a non-empty local part and domain.
pub fn normalize_email(value: Option<&str>) -> ValidationResult<String> {
    let email = required_text("email", value, 254)?.to_lowercase();

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(ValidationError("email must be a valid email address".into())),
    }
}

pub fn password(value: Option<&str>) -> ValidationResult<String> {
    let value = value.unwrap_or_default();
    let len = value.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(value.to_string())
}

/// Absolute http(s) URL.
pub fn http_url(value: Option<&str>) -> ValidationResult<String> {
    let raw = required_text("url", value, 2048)?;
    let parsed =
        Url::parse(&raw).map_err(|_| ValidationError("url must be a valid URL".into()))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed.to_string()),
        _ => Err(ValidationError("url must use http or https".into())),
    }
}

fn check_length(field: &str, value: &str, max_chars: usize) -> ValidationResult<()> {
    if value.chars().count() > max_chars {
        return Err(ValidationError(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(())
}
