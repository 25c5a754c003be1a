#![warn(clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Authentication building blocks for actix-web REST APIs
//!
//! - [`session`] - Access/refresh token sessions with signature cookies
//! - [`hmac_verification`] - HMAC signed request bodies
//! - [`oauth2`] - Bearer JWT verification against a static keyset
//! - [`security`] - Response headers, CSRF and content-type guards
//! - [`settings`] - `Settings.toml` and environment configuration

/// Version of the api-guard crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod hmac_verification;
#[cfg(feature = "oauth2")]
pub mod oauth2;
pub mod security;
pub mod session;
pub mod settings;
pub mod token;
pub mod utils;

#[cfg(feature = "testing")]
pub mod testing;

/// Re-export commonly used items
pub use hmac_verification::{HmacConfig, HmacSignedBody, HmacVerifier};
#[cfg(feature = "oauth2")]
pub use oauth2::{JwksVerifier, JwtVerifier, OAuth2Config, VerifiedJwt};
pub use security::{RequestGuards, SecurityHeaders};
pub use session::{AuthenticatedSession, SessionConfig, SessionManager};
pub use settings::{ConfigError, Settings};
pub use token::TokenTransport;
