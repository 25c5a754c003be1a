//! Testing utilities for api-guard
//!
//! Shared fixtures for unit and integration tests, enabled with the
//! `testing` feature.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built configs and session managers
//! - [`mock`] - In-memory user provider and failing collaborators
//! - [`requests`] - HTTP request builders carrying tokens and signatures
//! - [`signing`] - HMAC signed bodies and JWT/JWK helpers
//! - [`assertions`] - Assertion helpers for error responses
//!
//! ## Usage
//!
//! ```rust,ignore
//! use api_guard::testing::{RequestBuilder, TestFixtures};
//! use api_guard::TokenTransport;
//!
//! let (manager, _store) = TestFixtures::session_manager();
//! let login = RequestBuilder::new().build();
//! let tokens = manager.create(&login, &TestFixtures::user(), TokenTransport::Bearer).await?;
//! let req = RequestBuilder::with_access_token(&tokens).build();
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock;
pub mod requests;
pub mod signing;

// Re-export commonly used items for convenience
pub use assertions::*;
pub use fixtures::TestFixtures;
pub use mock::{FailingSessionStore, MockUserProvider, TestUser};
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    /// Active test user
    pub const TEST_USER_ID: &str = "alice";

    /// Inactive test user
    pub const INACTIVE_USER_ID: &str = "bob";

    /// Default test client IP
    pub const TEST_CLIENT_IP: &str = "192.168.1.1";

    /// Session token secret (256 bits)
    pub const TEST_TOKEN_SECRET: &str = "test_token_secret_32_bytes_long!";

    /// HMAC request signing secret
    pub const TEST_HMAC_SECRET: &str = "test_hmac_secret_32_bytes_long!!";

    pub const ACCESS_SIGNATURE_COOKIE: &str = "access_sig";
    pub const REFRESH_SIGNATURE_COOKIE: &str = "refresh_sig";
    pub const REFRESH_PATH: &str = "/auth/refresh";

    /// Issuer expected by test OAuth2 configs
    pub const TEST_ISSUER: &str = "https://auth.example.com";
}
