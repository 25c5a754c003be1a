//! OAuth2 bearer token verification
//!
//! Client-side verification of JWTs issued by an OAuth2 authorization server:
//! signature against a static JSON Web Key Set, algorithm whitelist, expiry
//! and issuer, with optional scope and audience checks on top.
//!
//! # Modules
//!
//! - [`jwks`] - Keyset decoding and per-key signature verification
//! - [`verifier`] - `JwtVerifier` capability and its `JwksVerifier` implementation
//! - [`claims`] - Scope and audience checks
//! - [`error`] - Rejection reasons

pub mod claims;
pub mod error;
pub mod jwks;
pub mod verifier;

pub use claims::{verify_audience, verify_scope};
pub use error::OAuth2Error;
pub use jwks::{JsonWebKey, JwtAlgorithm, KeySet, KeySetError};
pub use verifier::{JwksVerifier, JwtVerifier, OAuth2Config, VerifiedJwt};
