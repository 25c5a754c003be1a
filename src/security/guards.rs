use actix_web::HttpRequest;

use super::content_type::require_content_type;
use super::csrf::{require_csrf_header, DEFAULT_CSRF_HEADER};
use super::error::GuardError;

/// Configured CSRF and content-type checks, run together on each request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestGuards {
    csrf_header: String,
    allowed_content_types: Vec<String>,
}

impl Default for RequestGuards {
    fn default() -> Self {
        Self::new(DEFAULT_CSRF_HEADER, vec!["application/json".to_string()])
    }
}

impl RequestGuards {
    #[must_use]
    pub fn new(csrf_header: &str, allowed_content_types: Vec<String>) -> Self {
        Self {
            csrf_header: csrf_header.to_ascii_lowercase(),
            allowed_content_types,
        }
    }

    #[must_use]
    pub fn csrf_header(&self) -> &str {
        &self.csrf_header
    }

    #[must_use]
    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Run the CSRF check, then the content-type check
    ///
    /// # Errors
    ///
    /// Returns the first failing guard
    pub fn check(&self, req: &HttpRequest) -> Result<(), GuardError> {
        require_csrf_header(req, &self.csrf_header)?;
        require_content_type(req, &self.allowed_content_types)
    }
}
