use actix_web::{http::Method, HttpRequest};

use super::error::GuardError;

pub const DEFAULT_CSRF_HEADER: &str = "x-csrf-token";

/// Require a custom header on state-changing requests
///
/// Browsers never attach custom headers to cross-site form posts, so its
/// presence is enough; the value is not inspected.
///
/// # Errors
///
/// Returns `GuardError::MissingCsrfHeader` for a non-safe method without the header
pub fn require_csrf_header(req: &HttpRequest, header_name: &str) -> Result<(), GuardError> {
    if is_safe_method(req.method()) || req.headers().contains_key(header_name) {
        return Ok(());
    }

    log::debug!(
        "Rejecting {} {}: missing {header_name} header",
        req.method(),
        req.path()
    );
    Err(GuardError::MissingCsrfHeader)
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_safe_methods_pass() {
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            let req = TestRequest::default().method(method).to_http_request();
            assert!(require_csrf_header(&req, DEFAULT_CSRF_HEADER).is_ok());
        }
    }

    #[test]
    fn test_unsafe_methods_need_header() {
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            let req = TestRequest::default().method(method.clone()).to_http_request();
            assert_eq!(
                require_csrf_header(&req, DEFAULT_CSRF_HEADER),
                Err(GuardError::MissingCsrfHeader),
                "{method}"
            );

            let req = TestRequest::default()
                .method(method)
                .insert_header(("X-CSRF-Token", "1"))
                .to_http_request();
            assert!(require_csrf_header(&req, DEFAULT_CSRF_HEADER).is_ok());
        }
    }
}
