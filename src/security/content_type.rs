use actix_web::{
    http::{header::CONTENT_TYPE, Method},
    HttpRequest,
};

use super::error::GuardError;

/// Require an allowed `content-type` on requests that carry a body
///
/// Only the media type is compared; parameters such as `charset` are ignored.
///
/// # Errors
///
/// Returns `GuardError::UnsupportedMediaType` for a POST, PUT or PATCH whose
/// media type is missing or not in `allowed`
pub fn require_content_type<S: AsRef<str>>(
    req: &HttpRequest,
    allowed: &[S],
) -> Result<(), GuardError> {
    if !matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH) {
        return Ok(());
    }

    let media_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if !media_type.is_empty()
        && allowed
            .iter()
            .any(|a| a.as_ref().eq_ignore_ascii_case(media_type))
    {
        return Ok(());
    }

    log::debug!(
        "Rejecting {} {}: content type {media_type:?} not allowed",
        req.method(),
        req.path()
    );
    Err(GuardError::UnsupportedMediaType)
}
