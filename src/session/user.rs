use async_trait::async_trait;

/// An authenticated principal as seen by the session manager
pub trait Principal: Send + Sync {
    fn user_id(&self) -> &str;

    /// Inactive principals cannot refresh their sessions
    fn is_active(&self) -> bool {
        true
    }
}

/// Principal lookup used during refresh
#[async_trait]
pub trait UserProvider: Send + Sync {
    type User: Principal;

    /// Load a principal by id
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails; an unknown id is `Ok(None)`
    async fn find_user(&self, user_id: &str) -> anyhow::Result<Option<Self::User>>;
}
