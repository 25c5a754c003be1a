//! Test fixtures providing pre-built configs and managers
//!
//! Every fixture uses the values in [`super::constants`], so requests built
//! with [`super::RequestBuilder`] line up with them.

use std::sync::Arc;

use super::constants::{
    ACCESS_SIGNATURE_COOKIE, REFRESH_PATH, REFRESH_SIGNATURE_COOKIE, TEST_HMAC_SECRET,
    TEST_TOKEN_SECRET, TEST_USER_ID,
};
use super::mock::{MockUserProvider, TestUser};
use crate::hmac_verification::{HmacConfig, HmacVerifier};
use crate::session::{InMemorySessionStore, SessionConfig, SessionManager};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Session config with a 15 minute access TTL and a 1 day refresh TTL
    #[must_use]
    pub fn session_config() -> SessionConfig {
        SessionConfig::new(
            TEST_TOKEN_SECRET,
            900,
            86_400,
            ACCESS_SIGNATURE_COOKIE,
            REFRESH_SIGNATURE_COOKIE,
            REFRESH_PATH,
        )
    }

    /// Session config bounding sessions to `session_ttl` seconds
    #[must_use]
    pub fn session_config_with_ttl(session_ttl: u64) -> SessionConfig {
        Self::session_config().with_session_ttl(Some(session_ttl))
    }

    /// Session manager over an empty in-memory store and [`MockUserProvider::standard`]
    #[must_use]
    pub fn session_manager() -> (SessionManager<MockUserProvider>, Arc<InMemorySessionStore>) {
        Self::session_manager_with(Self::session_config())
    }

    #[must_use]
    pub fn session_manager_with(
        config: SessionConfig,
    ) -> (SessionManager<MockUserProvider>, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = SessionManager::new(
            config,
            store.clone(),
            Arc::new(MockUserProvider::standard()),
        );
        (manager, store)
    }

    /// The active standard user
    #[must_use]
    pub fn user() -> TestUser {
        TestUser::active(TEST_USER_ID)
    }

    #[must_use]
    pub fn hmac_config() -> HmacConfig {
        HmacConfig::new(TEST_HMAC_SECRET)
    }

    #[must_use]
    pub fn hmac_verifier() -> HmacVerifier {
        HmacVerifier::new(Self::hmac_config())
    }
}
