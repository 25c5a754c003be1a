//! HTTP response handling
//!
//! A single builder for the JSON error bodies every guard in this crate
//! renders (`{"error": .., "error_description": ..}`) and for the JSON success
//! bodies that carry freshly issued tokens and their cookies.

use actix_web::{cookie::Cookie, http::header, http::StatusCode, HttpResponse};
use serde_json::json;

/// Unified response builder for error and JSON responses
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    /// Create an `Unauthorized` (401) error response with optional customization
    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Unauthorized)
    }

    /// Create a `Forbidden` (403) error response with optional customization
    #[must_use]
    pub fn forbidden() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Forbidden)
    }

    /// Create an `UnsupportedMediaType` (415) error response with optional customization
    #[must_use]
    pub fn unsupported_media_type() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::UnsupportedMediaType)
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// Create a 200 OK JSON response builder
    #[must_use]
    pub fn ok() -> JsonResponseBuilder {
        JsonResponseBuilder::new(StatusCode::OK)
    }

    /// Create a 204 No Content response that only sets cookies
    #[must_use]
    pub fn no_content_with_cookies(cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::NoContent();
        for cookie in cookies {
            builder.cookie(cookie);
        }
        builder.finish()
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
    description: Option<String>,
}

/// Builder for JSON responses
pub struct JsonResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
}

/// Supported HTTP error response types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorType {
    Unauthorized,
    Forbidden,
    UnsupportedMediaType,
}

// ===============================
// ERROR RESPONSE BUILDER IMPL
// ===============================

impl ErrorResponseBuilder {
    const fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
            description: None,
        }
    }

    /// Set a custom error code (e.g., "`invalid_token`", "`invalid_signature`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// Set the human readable `error_description`
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let error_code = self
            .error_code
            .clone()
            .unwrap_or_else(|| self.default_error_code().to_string());
        let description = self
            .description
            .clone()
            .unwrap_or_else(|| self.default_description().to_string());

        HttpResponse::build(self.status())
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(json!({
                "error": error_code,
                "error_description": description,
            }))
    }

    const fn status(&self) -> StatusCode {
        match self.error_type {
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::Forbidden => StatusCode::FORBIDDEN,
            ErrorType::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    const fn default_error_code(&self) -> &'static str {
        match self.error_type {
            ErrorType::Unauthorized => "unauthorized",
            ErrorType::Forbidden => "forbidden",
            ErrorType::UnsupportedMediaType => "unsupported_media_type",
        }
    }

    const fn default_description(&self) -> &'static str {
        match self.error_type {
            ErrorType::Unauthorized => "Authentication is required to access this resource",
            ErrorType::Forbidden => "Access to this resource is forbidden",
            ErrorType::UnsupportedMediaType => "unsupported media type",
        }
    }
}

// ===============================
// JSON RESPONSE BUILDER IMPL
// ===============================

impl JsonResponseBuilder {
    fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }

    /// Add a custom header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Attach cookies to the response
    #[must_use]
    pub fn with_cookies(mut self, mut cookies: Vec<Cookie<'static>>) -> Self {
        self.cookies.append(&mut cookies);
        self
    }

    /// Build the response with JSON content
    #[must_use]
    pub fn json<T: serde::Serialize>(self, data: &T) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);

        for (name, value) in self.headers {
            builder.insert_header((name, value));
        }
        for cookie in self.cookies {
            builder.cookie(cookie);
        }

        builder.json(data)
    }
}
