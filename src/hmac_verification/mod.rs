//! HMAC request signing
//!
//! - [`verifier`] - Body verification, signing helper and the request extractor
//! - [`error`] - Rejection reasons

pub mod error;
pub mod verifier;

pub use error::HmacError;
pub use verifier::{
    sign_body, verify, verify_at, HmacConfig, HmacSignedBody, HmacVerifier, SignedBody,
    DEFAULT_MAX_AGE_SECONDS,
};
