//! Session Manager - access/refresh token lifecycle
//!
//! The `SessionManager` issues, verifies, rotates and revokes sessions:
//!
//! - **fetch**: verify the access token of a request, statelessly
//! - **create**: start or rotate a session and issue a new token pair
//! - **refresh**: redeem a single-use refresh token, then `create`
//! - **delete**: revoke the session and clear the signature cookies
//!
//! Every operation records its outcome as a [`SessionContext`] in the
//! request extensions, so later extractors see the same verdict.
//!
//! ## Organization
//!
//! 1. **Types** - issued token pairs and their response
//! 2. **Construction**
//! 3. **Fetch**
//! 4. **Create**
//! 5. **Refresh**
//! 6. **Delete**
//! 7. **Helpers**

use std::sync::Arc;

use actix_web::{cookie::Cookie, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use super::config::SessionConfig;
use super::context::SessionContext;
use super::cookie::CookieFactory;
use super::error::SessionAuthError;
use super::models::{AccessTokenPayload, RefreshTokenPayload, Session, TokenClaims};
use super::store::SessionStore;
use super::user::{Principal, UserProvider};
use crate::token::{get_token, split, TokenCodec, TokenTransport, Verified};
use crate::utils::responses::ResponseBuilder;

// =============================================================================
// 1. Types
// =============================================================================

/// A freshly signed token pair
///
/// With cookie transport the tokens are only the `header.payload` halves and
/// `cookies` carries the signatures; with bearer transport the tokens are
/// complete and `cookies` is empty.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_ttl: u64,
    pub refresh_token_ttl: u64,
    pub cookies: Vec<Cookie<'static>>,
    pub session: Session,
}

/// JSON body returned to clients after login or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_in: u64,
    pub refresh_token_expires_in: u64,
}

impl IssuedTokens {
    #[must_use]
    pub fn body(&self) -> TokenResponse {
        TokenResponse {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            access_token_expires_in: self.access_token_ttl,
            refresh_token_expires_in: self.refresh_token_ttl,
        }
    }

    /// 200 response with the token body and any signature cookies
    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        let body = self.body();
        ResponseBuilder::ok()
            .with_header("cache-control", "no-store")
            .with_cookies(self.cookies)
            .json(&body)
    }
}

// =============================================================================
// 2. Construction
// =============================================================================

/// Session lifecycle manager
pub struct SessionManager<U: UserProvider> {
    config: Arc<SessionConfig>,
    codec: TokenCodec,
    cookies: CookieFactory,
    store: Arc<dyn SessionStore>,
    users: Arc<U>,
}

impl<U: UserProvider> Clone for SessionManager<U> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            codec: self.codec.clone(),
            cookies: self.cookies.clone(),
            store: Arc::clone(&self.store),
            users: Arc::clone(&self.users),
        }
    }
}

impl<U: UserProvider> SessionManager<U> {
    #[must_use]
    pub fn new(config: SessionConfig, store: Arc<dyn SessionStore>, users: Arc<U>) -> Self {
        let codec = config.codec();
        let cookies = CookieFactory::new(&config);

        Self {
            config: Arc::new(config),
            codec,
            cookies,
            store,
            users,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    // =========================================================================
    // 3. Fetch
    // =========================================================================

    /// Verify the request's access token
    ///
    /// No store lookup happens on success: a revoked session keeps working
    /// until its access token expires.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason, which is also recorded in the request context
    pub async fn fetch(&self, req: &HttpRequest) -> Result<AccessTokenPayload, SessionAuthError> {
        match self.verify_access(req).await {
            Ok(payload) => {
                SessionContext::Authenticated(payload.clone()).attach(req);
                Ok(payload)
            }
            Err(err) => Err(reject(req, "fetch", err)),
        }
    }

    async fn verify_access(&self, req: &HttpRequest) -> Result<AccessTokenPayload, SessionAuthError> {
        self.read_token(
            req,
            &self.config.access_signature_cookie,
            &self.config.access_token_salt,
        )
        .await
    }

    // =========================================================================
    // 4. Create
    // =========================================================================

    /// Issue a token pair for `user`
    ///
    /// When `refresh` left a session in the request context, that session is
    /// rotated and keeps its own transport. Otherwise a new session is
    /// started with `transport`.
    ///
    /// # Errors
    ///
    /// Returns `refresh token stale` if a concurrent refresh rotated the
    /// session first, or `unexpected error` if the store or signing fails
    pub async fn create(
        &self,
        req: &HttpRequest,
        user: &impl Principal,
        transport: TokenTransport,
    ) -> Result<IssuedTokens, SessionAuthError> {
        match self.issue(req, user, transport).await {
            Ok(tokens) => {
                SessionContext::Authenticated(tokens.session.access_payload()).attach(req);
                Ok(tokens)
            }
            Err(err) => Err(reject(req, "create", err)),
        }
    }

    async fn issue(
        &self,
        req: &HttpRequest,
        user: &impl Principal,
        transport: TokenTransport,
    ) -> Result<IssuedTokens, SessionAuthError> {
        let ip = client_ip(req);

        let session = match SessionContext::take(req) {
            Some(SessionContext::Refreshing(mut session)) => {
                let redeemed = session.refresh_token_id.clone();
                session.rotate(ip);

                let swapped = self
                    .store
                    .rotate(&session, &redeemed)
                    .await
                    .map_err(|e| SessionAuthError::unexpected("session rotation", e))?;
                if !swapped {
                    return Err(SessionAuthError::RefreshTokenStale);
                }

                info!("Session {} refreshed for user {}", session.id, session.user_id);
                session
            }
            _ => {
                let session = Session::new(user.user_id(), transport, self.config.session_ttl, ip);

                self.store
                    .put(&session)
                    .await
                    .map_err(|e| SessionAuthError::unexpected("session insert", e))?;

                info!(
                    "Session {} created for user {} ({} transport)",
                    session.id, session.user_id, session.token_signature_transport
                );
                session
            }
        };

        self.sign_pair(session)
    }

    fn sign_pair(&self, session: Session) -> Result<IssuedTokens, SessionAuthError> {
        let now = Utc::now().timestamp();
        let access_token_ttl = session.token_ttl(self.config.access_token_ttl, now);
        let refresh_token_ttl = session.token_ttl(self.config.refresh_token_ttl, now);

        let access_token = self.codec.sign_now(
            &self.config.access_token_salt,
            &session.access_payload(),
            access_token_ttl,
        )?;
        let refresh_token = self.codec.sign_now(
            &self.config.refresh_token_salt,
            &session.refresh_payload(),
            refresh_token_ttl,
        )?;

        if session.token_signature_transport == TokenTransport::Bearer {
            return Ok(IssuedTokens {
                access_token,
                refresh_token,
                access_token_ttl,
                refresh_token_ttl,
                cookies: Vec::new(),
                session,
            });
        }

        let (Some(access), Some(refresh)) = (split(&access_token), split(&refresh_token)) else {
            return Err(SessionAuthError::unexpected(
                "token split",
                "signed token has no signature segment",
            ));
        };

        Ok(IssuedTokens {
            cookies: vec![
                self.cookies
                    .access_signature_cookie(&access.signature, access_token_ttl),
                self.cookies
                    .refresh_signature_cookie(&refresh.signature, refresh_token_ttl),
            ],
            access_token: access.header_and_payload,
            refresh_token: refresh.header_and_payload,
            access_token_ttl,
            refresh_token_ttl,
            session,
        })
    }

    // =========================================================================
    // 5. Refresh
    // =========================================================================

    /// Redeem the request's refresh token for a new token pair
    ///
    /// The refresh token must carry the session's current refresh token id,
    /// so each refresh token works at most once.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason, which is also recorded in the request context
    pub async fn refresh(
        &self,
        req: &HttpRequest,
    ) -> Result<(U::User, IssuedTokens), SessionAuthError> {
        let (session, user) = match self.redeem(req).await {
            Ok(found) => found,
            Err(err) => return Err(reject(req, "refresh", err)),
        };

        let transport = session.token_signature_transport;
        SessionContext::Refreshing(session).attach(req);

        let tokens = self.create(req, &user, transport).await?;
        Ok((user, tokens))
    }

    async fn redeem(&self, req: &HttpRequest) -> Result<(Session, U::User), SessionAuthError> {
        let payload: RefreshTokenPayload = self
            .read_token(
                req,
                &self.config.refresh_signature_cookie,
                &self.config.refresh_token_salt,
            )
            .await?;

        let session = self
            .store
            .get(payload.session_id)
            .await
            .map_err(|e| SessionAuthError::unexpected("session lookup", e))?
            .ok_or(SessionAuthError::SessionNotFound)?;

        if session.refresh_token_id != payload.refresh_token_id {
            warn!(
                "Stale refresh token presented for session {} (user {})",
                session.id, session.user_id
            );
            return Err(SessionAuthError::RefreshTokenStale);
        }

        let user = self
            .users
            .find_user(&payload.user_id)
            .await
            .map_err(|e| SessionAuthError::unexpected("user lookup", e))?
            .ok_or(SessionAuthError::UserNotFound)?;

        if !user.is_active() {
            return Err(SessionAuthError::UserInactive);
        }

        Ok((session, user))
    }

    // =========================================================================
    // 6. Delete
    // =========================================================================

    /// Revoke the session of an already fetched request
    ///
    /// Returns the expired signature cookies to send back. The access token
    /// itself stays valid until it expires; only refreshes are blocked.
    ///
    /// # Errors
    ///
    /// Returns the recorded rejection, `token not found` if `fetch` never ran,
    /// or `unexpected error` if the store fails
    pub async fn delete(&self, req: &HttpRequest) -> Result<Vec<Cookie<'static>>, SessionAuthError> {
        let payload = match SessionContext::current(req) {
            Some(SessionContext::Authenticated(payload)) => payload,
            Some(SessionContext::Rejected(err)) => return Err(err),
            _ => return Err(SessionAuthError::TokenNotFound),
        };

        self.store
            .delete(payload.session_id)
            .await
            .map_err(|e| reject(req, "delete", SessionAuthError::unexpected("session delete", e)))?;

        info!(
            "Session {} deleted for user {}",
            payload.session_id, payload.user_id
        );
        SessionContext::Deleted(payload.session_id).attach(req);

        Ok(self.cookies.expired_cookies())
    }

    // =========================================================================
    // 7. Helpers
    // =========================================================================

    /// Read, verify and check a token of either kind
    async fn read_token<T>(
        &self,
        req: &HttpRequest,
        signature_cookie: &str,
        namespace: &str,
    ) -> Result<T, SessionAuthError>
    where
        T: DeserializeOwned + TokenClaims,
    {
        let (transport, token) =
            get_token(req, signature_cookie).ok_or(SessionAuthError::TokenNotFound)?;

        let verified: Verified<serde_json::Value> =
            self.codec.verify_signature(namespace, &token, None)?;
        let payload: T = serde_json::from_value(verified.data)
            .map_err(|_| SessionAuthError::MalformedPayload)?;

        // Token lifetimes never outlast the session, so an expired session
        // usually arrives with an expired token too
        if payload
            .expires_at()
            .is_some_and(|exp| exp <= Utc::now().timestamp())
        {
            self.expire(payload.session_id()).await;
            return Err(SessionAuthError::SessionExpired);
        }

        if verified.expired {
            return Err(SessionAuthError::TokenExpired);
        }

        if payload.transport() != transport {
            return Err(SessionAuthError::TransportMismatch);
        }

        Ok(payload)
    }

    /// Drop an expired session from the store
    async fn expire(&self, session_id: Uuid) {
        if let Err(e) = self.store.delete(session_id).await {
            // The session is rejected either way
            warn!("Failed to delete expired session {session_id}: {e}");
        } else {
            debug!("Deleted expired session {session_id}");
        }
    }
}

/// Record a rejection in the request context
fn reject(req: &HttpRequest, operation: &str, err: SessionAuthError) -> SessionAuthError {
    debug!("Session {operation} rejected: {err}");
    SessionContext::Rejected(err.clone()).attach(req);
    err
}

fn client_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info()
        .realip_remote_addr()
        .map(ToString::to_string)
}
