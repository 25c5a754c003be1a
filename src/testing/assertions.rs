//! Assertion helpers for guard responses

use actix_web::{body::MessageBody, http::StatusCode, HttpResponse};
use serde_json::Value;

/// Assert that an HTTP response has the expected status code
///
/// # Panics
///
/// Panics if the response status does not match the expected status code.
pub fn assert_status<B>(response: &HttpResponse<B>, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {expected}, got {}",
        response.status()
    );
}

/// Assert that an HTTP response contains a specific header
///
/// # Panics
///
/// Panics if the header is not present in the response.
pub fn assert_header_present<B>(response: &HttpResponse<B>, header_name: &str) {
    assert!(
        response.headers().contains_key(header_name),
        "Expected header '{header_name}' to be present"
    );
}

/// Assert an error response's status and `error_description`
///
/// # Panics
///
/// Panics if the status differs, the body is not JSON, or the description differs.
pub async fn assert_error_response<B>(
    response: HttpResponse<B>,
    expected_status: StatusCode,
    expected_description: &str,
) where
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    assert_status(&response, expected_status);

    let bytes = actix_web::body::to_bytes(response.into_body())
        .await
        .expect("error body should be readable");
    let body: Value = serde_json::from_slice(&bytes).expect("error body should be JSON");
    assert_eq!(
        body.get("error_description").and_then(Value::as_str),
        Some(expected_description),
        "unexpected error body: {body}"
    );
}
