use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("url is empty")]
    Empty,
    #[error("url is malformed: {0}")]
    Malformed(String),
    #[error("url has no host")]
    MissingHost,
}

/// Checks a submitted address locally so malformed input never reaches the service.
///
/// Accepts anything with a scheme and a host. Returns the trimmed input,
/// unchanged otherwise, since the service stores the address as submitted.
pub fn validate_submission(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    // A bare word such as `not-a-url` fails here with RelativeUrlWithoutBase.
    let parsed = Url::parse(trimmed).map_err(|err| ValidationError::Malformed(err.to_string()))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ValidationError::MissingHost),
    }
}
