//! Store logo validation.
//!
//! Logos are stored inline as `data:` URLs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Largest accepted decoded image.
pub const MAX_LOGO_BYTES: usize = 512 * 1024;

const ALLOWED_MIME: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogoError {
    #[error("logo must be a base64 data URL")]
    NotDataUrl,
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("logo is not valid base64")]
    InvalidBase64,
    #[error("logo is empty")]
    Empty,
    #[error("logo is {0} bytes, the limit is {MAX_LOGO_BYTES}")]
    TooLarge(usize),
}

/// Check a `data:<mime>;base64,<payload>` URL and return its MIME type.
///
/// # Errors
///
/// Returns [`LogoError`] for a malformed URL, a type other than
/// png/jpeg/webp/gif, or an image over [`MAX_LOGO_BYTES`].
pub fn validate_data_url(data_url: &str) -> Result<&str, LogoError> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or(LogoError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(LogoError::NotDataUrl)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(LogoError::NotDataUrl)?;

    if !ALLOWED_MIME.contains(&mime) {
        return Err(LogoError::UnsupportedType(mime.to_string()));
    }

    // Reject oversized input before decoding it
    if payload.len() / 4 * 3 > MAX_LOGO_BYTES + 3 {
        return Err(LogoError::TooLarge(payload.len() / 4 * 3));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| LogoError::InvalidBase64)?;
    if bytes.is_empty() {
        return Err(LogoError::Empty);
    }
    if bytes.len() > MAX_LOGO_BYTES {
        return Err(LogoError::TooLarge(bytes.len()));
    }

    Ok(mime)
}
