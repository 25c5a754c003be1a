use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::utils::responses::ResponseBuilder;

/// Reasons a bearer JWT is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuth2Error {
    #[error("bearer token not found")]
    BearerNotFound,
    #[error("could not decode JWT")]
    CouldNotDecode,
    #[error("unknown signing key")]
    UnknownSigningKey,
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("expired")]
    Expired,
    #[error("issuer mismatch")]
    IssuerMismatch,
    #[error("insufficient scope")]
    InsufficientScope,
    #[error("audience mismatch")]
    AudienceMismatch,
}

impl ResponseError for OAuth2Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        let code = match self {
            Self::InsufficientScope => "insufficient_scope",
            Self::BearerNotFound => "invalid_request",
            _ => "invalid_token",
        };

        ResponseBuilder::unauthorized()
            .with_error_code(code)
            .with_description(&self.to_string())
            .build()
    }
}
