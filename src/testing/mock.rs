//! Mock collaborators for isolated tests

use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use super::constants::{INACTIVE_USER_ID, TEST_USER_ID};
use crate::session::{Principal, Session, SessionStore, UserProvider};

/// Plain principal with an activity flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    pub id: String,
    pub active: bool,
}

impl TestUser {
    #[must_use]
    pub fn active(id: &str) -> Self {
        Self {
            id: id.to_string(),
            active: true,
        }
    }

    #[must_use]
    pub fn inactive(id: &str) -> Self {
        Self {
            id: id.to_string(),
            active: false,
        }
    }
}

impl Principal for TestUser {
    fn user_id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// User provider backed by a fixed map
#[derive(Debug, Clone, Default)]
pub struct MockUserProvider {
    users: HashMap<String, TestUser>,
}

impl MockUserProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider knowing one active and one inactive user
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_user(TestUser::active(TEST_USER_ID))
            .with_user(TestUser::inactive(INACTIVE_USER_ID))
    }

    #[must_use]
    pub fn with_user(mut self, user: TestUser) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }
}

#[async_trait]
impl UserProvider for MockUserProvider {
    type User = TestUser;

    async fn find_user(&self, user_id: &str) -> anyhow::Result<Option<TestUser>> {
        Ok(self.users.get(user_id).cloned())
    }
}

/// Session store whose every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn get(&self, _session_id: Uuid) -> anyhow::Result<Option<Session>> {
        Err(anyhow!("session store unavailable"))
    }

    async fn put(&self, _session: &Session) -> anyhow::Result<()> {
        Err(anyhow!("session store unavailable"))
    }

    async fn delete(&self, _session_id: Uuid) -> anyhow::Result<()> {
        Err(anyhow!("session store unavailable"))
    }
}
