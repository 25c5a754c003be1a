// Optional claim checks layered on top of a verified JWT

use serde_json::Value;

use super::error::OAuth2Error;
use super::verifier::VerifiedJwt;

/// Pass when the space-delimited `scope` claim shares a scope with `expected`
///
/// # Errors
///
/// Returns `OAuth2Error::InsufficientScope` otherwise, including when the
/// claim is absent
pub fn verify_scope<S: AsRef<str>>(jwt: &VerifiedJwt, expected: &[S]) -> Result<(), OAuth2Error> {
    let granted = jwt
        .claims
        .get("scope")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if granted
        .split_whitespace()
        .any(|scope| expected.iter().any(|e| e.as_ref() == scope))
    {
        Ok(())
    } else {
        Err(OAuth2Error::InsufficientScope)
    }
}

/// Pass only when the `aud` claim is exactly `expected`
///
/// # Errors
///
/// Returns `OAuth2Error::AudienceMismatch` otherwise; an array-valued `aud`
/// never matches
pub fn verify_audience(jwt: &VerifiedJwt, expected: &str) -> Result<(), OAuth2Error> {
    match jwt.claims.get("aud").and_then(Value::as_str) {
        Some(aud) if aud == expected => Ok(()),
        _ => Err(OAuth2Error::AudienceMismatch),
    }
}
