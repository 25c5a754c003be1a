use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::utils::responses::ResponseBuilder;

/// Reasons an HMAC-signed request is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HmacError {
    #[error("missing authorization header")]
    MissingAuthorizationHeader,
    #[error("hash mismatch")]
    HashMismatch,
    #[error("path missing")]
    PathMissing,
    #[error("path mismatch")]
    PathMismatch,
    #[error("method missing")]
    MethodMissing,
    #[error("method mismatch")]
    MethodMismatch,
    #[error("timestamp missing")]
    TimestampMissing,
    #[error("expired")]
    Expired,
    #[error("unknown error")]
    Unknown,
}

impl ResponseError for HmacError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        ResponseBuilder::unauthorized()
            .with_error_code("invalid_signature")
            .with_description(&self.to_string())
            .build()
    }
}
