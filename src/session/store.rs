//! Session persistence
//!
//! The manager only ever reads, writes and deletes whole [`Session`] records
//! keyed by id. Real deployments plug in their own store; the in-memory one
//! serves tests and single-node services.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::Session;

/// Keyed persistence for session records
///
/// Writes are last-write-wins. Implementations backed by a database should
/// override [`SessionStore::rotate`] with a conditional update.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session by id
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Session>>;

    /// Insert or replace a session
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails
    async fn put(&self, session: &Session) -> anyhow::Result<()>;

    /// Remove a session; removing an unknown id is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails
    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;

    /// Replace a session only while its stored refresh token id still equals
    /// `expected_refresh_token_id`
    ///
    /// Returns `false` when the record is gone or was rotated by someone else.
    /// The default implementation reads then writes and is not atomic.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails
    async fn rotate(
        &self,
        session: &Session,
        expected_refresh_token_id: &str,
    ) -> anyhow::Result<bool> {
        match self.get(session.id).await? {
            Some(current) if current.refresh_token_id == expected_refresh_token_id => {
                self.put(session).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Session>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn put(&self, session: &Session) -> anyhow::Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        self.sessions.write().await.remove(&id);
        Ok(())
    }

    async fn rotate(
        &self,
        session: &Session,
        expected_refresh_token_id: &str,
    ) -> anyhow::Result<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(current) if current.refresh_token_id == expected_refresh_token_id => {
                *current = session.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
