//! Request guards and response hardening for API endpoints
//!
//! - [`headers`] - Security response headers
//! - [`csrf`] - Custom-header CSRF check
//! - [`content_type`] - Allowed request media types
//! - [`guards`] - Both checks, configured from settings

pub mod content_type;
pub mod csrf;
pub mod error;
pub mod guards;
pub mod headers;

pub use content_type::require_content_type;
pub use csrf::{require_csrf_header, DEFAULT_CSRF_HEADER};
pub use error::GuardError;
pub use guards::RequestGuards;
pub use headers::SecurityHeaders;
