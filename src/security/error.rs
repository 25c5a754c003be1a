use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::utils::responses::ResponseBuilder;

/// Rejections raised by the request guards
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("missing csrf header")]
    MissingCsrfHeader,
    #[error("unsupported media type")]
    UnsupportedMediaType,
}

impl ResponseError for GuardError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCsrfHeader => StatusCode::FORBIDDEN,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::MissingCsrfHeader => ResponseBuilder::forbidden()
                .with_error_code("csrf")
                .with_description(&self.to_string())
                .build(),
            Self::UnsupportedMediaType => ResponseBuilder::unsupported_media_type()
                .with_description(&self.to_string())
                .build(),
        }
    }
}
