use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::token::TokenTransport;
use crate::utils::crypto::generate_nonce;

/// Random bytes behind every refresh token identifier
const REFRESH_TOKEN_ID_BYTES: usize = 24;

/// Server-side session record
///
/// Only the store ever sees this; clients receive the narrower token payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    /// Identifier the next refresh token must present; replaced on every refresh
    pub refresh_token_id: String,
    pub created_at: i64,
    pub refreshed_at: i64,
    pub last_known_ip: Option<String>,
    pub token_signature_transport: TokenTransport,
    /// Absolute expiry, fixed at creation
    pub expires_at: Option<i64>,
}

impl Session {
    /// Start a new session for `user_id`
    #[must_use]
    pub fn new(
        user_id: &str,
        transport: TokenTransport,
        session_ttl: Option<u64>,
        last_known_ip: Option<String>,
    ) -> Self {
        let now = Utc::now().timestamp();

        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            refresh_token_id: generate_nonce(REFRESH_TOKEN_ID_BYTES),
            created_at: now,
            refreshed_at: now,
            last_known_ip,
            token_signature_transport: transport,
            expires_at: session_ttl
                .map(|ttl| now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX))),
        }
    }

    /// Rotate the refresh token identifier in place after a successful refresh
    pub fn rotate(&mut self, last_known_ip: Option<String>) {
        self.refresh_token_id = generate_nonce(REFRESH_TOKEN_ID_BYTES);
        self.refreshed_at = Utc::now().timestamp();
        self.last_known_ip = last_known_ip;
    }

    /// Whether the absolute expiry has passed at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Lifetime of a token issued at `now`, capped by the session's own expiry
    #[must_use]
    pub fn token_ttl(&self, configured_ttl: u64, now: i64) -> u64 {
        capped_ttl(configured_ttl, self.expires_at, now)
    }

    #[must_use]
    pub fn access_payload(&self) -> AccessTokenPayload {
        AccessTokenPayload {
            user_id: self.user_id.clone(),
            session_id: self.id,
            transport: self.token_signature_transport,
            expires_at: self.expires_at,
        }
    }

    #[must_use]
    pub fn refresh_payload(&self) -> RefreshTokenPayload {
        RefreshTokenPayload {
            refresh_token_id: self.refresh_token_id.clone(),
            user_id: self.user_id.clone(),
            session_id: self.id,
            transport: self.token_signature_transport,
            expires_at: self.expires_at,
        }
    }
}

/// `min(configured_ttl, expires_at - now)`, never negative
#[must_use]
pub fn capped_ttl(configured_ttl: u64, expires_at: Option<i64>, now: i64) -> u64 {
    match expires_at {
        Some(exp) => {
            let remaining = u64::try_from(exp.saturating_sub(now)).unwrap_or(0);
            configured_ttl.min(remaining)
        }
        None => configured_ttl,
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenPayload {
    pub user_id: String,
    pub session_id: Uuid,
    pub transport: TokenTransport,
    pub expires_at: Option<i64>,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenPayload {
    pub refresh_token_id: String,
    pub user_id: String,
    pub session_id: Uuid,
    pub transport: TokenTransport,
    pub expires_at: Option<i64>,
}

/// Fields shared by both payload kinds that the manager checks
pub trait TokenClaims {
    fn transport(&self) -> TokenTransport;
    fn session_id(&self) -> Uuid;
    fn expires_at(&self) -> Option<i64>;
}

impl TokenClaims for AccessTokenPayload {
    fn transport(&self) -> TokenTransport {
        self.transport
    }

    fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }
}

impl TokenClaims for RefreshTokenPayload {
    fn transport(&self) -> TokenTransport {
        self.transport
    }

    fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = Session::new("user-1", TokenTransport::Cookie, Some(3600), None);

        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.created_at, session.refreshed_at);
        assert_eq!(session.expires_at, Some(session.created_at + 3600));
        assert_eq!(session.refresh_token_id.len(), 32);
        assert!(!session.is_expired_at(session.created_at));
        assert!(session.is_expired_at(session.created_at + 3600));
    }

    #[test]
    fn test_session_without_absolute_expiry() {
        let session = Session::new("user-1", TokenTransport::Bearer, None, None);

        assert_eq!(session.expires_at, None);
        assert!(!session.is_expired_at(i64::MAX));
        assert_eq!(session.token_ttl(900, session.created_at), 900);
    }

    #[test]
    fn test_rotate_keeps_identity() {
        let mut session = Session::new("user-1", TokenTransport::Bearer, Some(60), None);
        let before = session.clone();

        session.rotate(Some("10.0.0.1".to_string()));

        assert_eq!(session.id, before.id);
        assert_eq!(session.created_at, before.created_at);
        assert_eq!(session.expires_at, before.expires_at);
        assert_eq!(session.token_signature_transport, before.token_signature_transport);
        assert_ne!(session.refresh_token_id, before.refresh_token_id);
        assert_eq!(session.last_known_ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_capped_ttl() {
        assert_eq!(capped_ttl(1000, Some(110), 100), 10);
        assert_eq!(capped_ttl(5, Some(110), 100), 5);
        assert_eq!(capped_ttl(1000, Some(90), 100), 0);
        assert_eq!(capped_ttl(1000, None, 100), 1000);
    }

    #[test]
    fn test_payloads_mirror_session() {
        let session = Session::new("user-1", TokenTransport::Cookie, Some(60), None);

        let access = session.access_payload();
        assert_eq!(access.session_id, session.id);
        assert_eq!(access.transport, TokenTransport::Cookie);

        let refresh = session.refresh_payload();
        assert_eq!(refresh.refresh_token_id, session.refresh_token_id);
        assert_eq!(refresh.expires_at, session.expires_at);
    }
}
