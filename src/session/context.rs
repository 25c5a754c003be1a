//! Per-request session state kept in the actix request extensions

use std::future::{ready, Ready};
use std::ops::Deref;

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use uuid::Uuid;

use super::error::SessionAuthError;
use super::models::{AccessTokenPayload, Session};

/// Outcome of the session plug that last ran on this request
#[derive(Debug, Clone)]
pub enum SessionContext {
    /// A verified access token (from `fetch`, or issued by `create`)
    Authenticated(AccessTokenPayload),
    /// A session loaded by `refresh`, about to be rotated by `create`
    Refreshing(Session),
    Rejected(SessionAuthError),
    Deleted(Uuid),
}

impl SessionContext {
    /// Replace the request's session context
    pub fn attach(self, req: &HttpRequest) {
        req.extensions_mut().insert(self);
    }

    /// Current session context, if any plug ran
    #[must_use]
    pub fn current(req: &HttpRequest) -> Option<Self> {
        req.extensions().get::<Self>().cloned()
    }

    /// Take the context out of the request, leaving none behind
    #[must_use]
    pub fn take(req: &HttpRequest) -> Option<Self> {
        req.extensions_mut().remove::<Self>()
    }
}

/// Extractor for handlers behind session authentication
///
/// Resolves to the verified access token payload or rejects with the reason
/// recorded by [`SessionManager::fetch`](super::SessionManager::fetch).
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub AccessTokenPayload);

impl AuthenticatedSession {
    #[must_use]
    pub fn into_inner(self) -> AccessTokenPayload {
        self.0
    }
}

impl Deref for AuthenticatedSession {
    type Target = AccessTokenPayload;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthenticatedSession {
    type Error = SessionAuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match SessionContext::current(req) {
            Some(SessionContext::Authenticated(payload)) => Ok(Self(payload)),
            Some(SessionContext::Rejected(err)) => Err(err),
            _ => Err(SessionAuthError::TokenNotFound),
        };
        ready(result)
    }
}
