//! Session Management Module
//!
//! Dual access/refresh token sessions for API authentication.
//!
//! # Modules
//!
//! - [`manager`] - Session lifecycle: fetch, create, refresh, delete
//! - [`models`] - Server-side session record and client-visible token payloads
//! - [`store`] - Session persistence trait and in-memory store
//! - [`context`] - Request context and the `AuthenticatedSession` extractor
//! - [`cookie`] - Signature cookie construction
//! - [`config`] - Runtime session configuration
//! - [`error`] - Rejection reasons
//! - [`user`] - Principal lookup

pub mod config;
pub mod context;
pub mod cookie;
pub mod error;
pub mod manager;
pub mod models;
pub mod store;
pub mod user;

// Re-export commonly used items for convenience
pub use config::SessionConfig;
pub use context::{AuthenticatedSession, SessionContext};
pub use cookie::{CookieFactory, CookieOptions};
pub use error::SessionAuthError;
pub use manager::{IssuedTokens, SessionManager, TokenResponse};
pub use models::{AccessTokenPayload, RefreshTokenPayload, Session};
pub use store::{InMemorySessionStore, SessionStore};
pub use user::{Principal, UserProvider};
