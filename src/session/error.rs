use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::token::TokenError;
use crate::utils::responses::ResponseBuilder;

/// Reasons a session-authenticated request is rejected
///
/// The `Display` text is the stable reason sent to clients. `Unexpected`
/// keeps its detail for the server log only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionAuthError {
    #[error("token not found")]
    TokenNotFound,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("malformed token payload")]
    MalformedPayload,
    #[error("token signature transport mismatch")]
    TransportMismatch,
    #[error("session expired")]
    SessionExpired,
    #[error("session not found")]
    SessionNotFound,
    #[error("refresh token stale")]
    RefreshTokenStale,
    #[error("user not found")]
    UserNotFound,
    #[error("user is not active")]
    UserInactive,
    #[error("unexpected error")]
    Unexpected(String),
}

impl SessionAuthError {
    /// Wrap a collaborator failure, logging the detail
    #[must_use]
    pub fn unexpected(context: &str, err: impl std::fmt::Display) -> Self {
        log::error!("Unexpected session error during {context}: {err}");
        Self::Unexpected(format!("{context}: {err}"))
    }

    const fn error_code(&self) -> &'static str {
        match self {
            Self::TokenNotFound => "missing_token",
            Self::TokenExpired | Self::TokenInvalid | Self::MalformedPayload => "invalid_token",
            Self::TransportMismatch => "invalid_transport",
            Self::SessionExpired | Self::SessionNotFound | Self::RefreshTokenStale => {
                "invalid_session"
            }
            Self::UserNotFound | Self::UserInactive => "invalid_user",
            Self::Unexpected(_) => "unauthorized",
        }
    }
}

impl From<TokenError> for SessionAuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid => Self::TokenInvalid,
            other @ (TokenError::UnknownNamespace(_) | TokenError::Encoding(_)) => {
                Self::unexpected("token codec", other)
            }
        }
    }
}

impl ResponseError for SessionAuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        ResponseBuilder::unauthorized()
            .with_error_code(self.error_code())
            .with_description(&self.to_string())
            .build()
    }
}
