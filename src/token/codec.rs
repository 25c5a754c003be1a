//! Namespaced, expiring, HMAC-signed tokens
//!
//! Tokens have the shape `header.payload.signature`, every segment encoded as
//! unpadded base64url:
//!
//! - `header` names the digest (`HS256`, `HS384`, `HS512`)
//! - `payload` is JSON `{"data": .., "signed": <ms>, "max_age": <seconds>}`
//! - `signature` is the MAC over `header.payload`
//!
//! The MAC key of every namespace is derived from the shared secret and the
//! namespace string, so a token minted for one namespace never verifies under
//! another one.

use std::collections::HashMap;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::utils::crypto::{decode_segment, encode_segment, DigestAlgorithm};

/// Reasons a token fails verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
    #[error("token namespace not configured: {0}")]
    UnknownNamespace(String),
    #[error("token payload could not be encoded: {0}")]
    Encoding(String),
}

/// Signing parameters of one namespace
#[derive(Clone)]
struct Namespace {
    key: Vec<u8>,
    digest: DigestAlgorithm,
}

#[derive(Serialize)]
struct SignedClaims<'a, T> {
    data: &'a T,
    signed: i64,
    max_age: u64,
}

#[derive(Deserialize)]
struct VerifiedClaims<T> {
    data: T,
    signed: i64,
    max_age: u64,
}

/// Payload of a token with a valid signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    pub data: T,
    /// Whether the token's lifetime has run out
    pub expired: bool,
}

/// Signs and verifies tokens for a fixed set of namespaces
#[derive(Clone)]
pub struct TokenCodec {
    namespaces: HashMap<String, Namespace>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("namespaces", &self.namespaces.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec for the given `(namespace, digest)` pairs
    #[must_use]
    pub fn new(secret: &[u8], namespaces: &[(&str, DigestAlgorithm)]) -> Self {
        let namespaces = namespaces
            .iter()
            .map(|(name, digest)| {
                let key = DigestAlgorithm::Sha256.mac(secret, name.as_bytes());
                ((*name).to_string(), Namespace { key, digest: *digest })
            })
            .collect();

        Self { namespaces }
    }

    fn namespace(&self, name: &str) -> Result<&Namespace, TokenError> {
        self.namespaces
            .get(name)
            .ok_or_else(|| TokenError::UnknownNamespace(name.to_string()))
    }

    /// Sign `payload` under `namespace`
    ///
    /// `signed_at` is a unix timestamp in milliseconds; `ttl` is in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is not configured or the payload
    /// cannot be serialized
    pub fn sign<T: Serialize>(
        &self,
        namespace: &str,
        payload: &T,
        ttl: u64,
        signed_at: i64,
    ) -> Result<String, TokenError> {
        let ns = self.namespace(namespace)?;

        let claims = SignedClaims {
            data: payload,
            signed: signed_at,
            max_age: ttl,
        };
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let header = encode_segment(ns.digest.jose_name().as_bytes());
        let body = encode_segment(&claims_json);
        let signing_input = format!("{header}.{body}");
        let signature = encode_segment(&ns.digest.mac(&ns.key, signing_input.as_bytes()));

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Sign `payload` under `namespace`, stamped with the current time
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::sign`]
    pub fn sign_now<T: Serialize>(
        &self,
        namespace: &str,
        payload: &T,
        ttl: u64,
    ) -> Result<String, TokenError> {
        self.sign(namespace, payload, ttl, Utc::now().timestamp_millis())
    }

    /// Verify `token` under `namespace` against the current time
    ///
    /// `max_age` overrides the lifetime embedded at signing time.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` or `TokenError::Invalid`
    pub fn verify<T: DeserializeOwned>(
        &self,
        namespace: &str,
        token: &str,
        max_age: Option<u64>,
    ) -> Result<T, TokenError> {
        self.verify_at(namespace, token, max_age, Utc::now().timestamp_millis())
    }

    /// Verify `token` under `namespace` at the given time in milliseconds
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` or `TokenError::Invalid`
    pub fn verify_at<T: DeserializeOwned>(
        &self,
        namespace: &str,
        token: &str,
        max_age: Option<u64>,
        now_ms: i64,
    ) -> Result<T, TokenError> {
        let verified = self.verify_signature_at(namespace, token, max_age, now_ms)?;
        if verified.expired {
            return Err(TokenError::Expired);
        }
        Ok(verified.data)
    }

    /// Check the signature of `token` against the current time, reporting
    /// expiry instead of failing on it
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for a bad signature or payload
    pub fn verify_signature<T: DeserializeOwned>(
        &self,
        namespace: &str,
        token: &str,
        max_age: Option<u64>,
    ) -> Result<Verified<T>, TokenError> {
        self.verify_signature_at(namespace, token, max_age, Utc::now().timestamp_millis())
    }

    /// Check the signature of `token` at `now_ms`, reporting expiry instead of
    /// failing on it
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for a bad signature or payload
    pub fn verify_signature_at<T: DeserializeOwned>(
        &self,
        namespace: &str,
        token: &str,
        max_age: Option<u64>,
        now_ms: i64,
    ) -> Result<Verified<T>, TokenError> {
        let ns = self.namespace(namespace)?;

        let Some((header, body, signature)) = segments(token) else {
            return Err(TokenError::Invalid);
        };

        let header_bytes = decode_segment(header).map_err(|_| TokenError::Invalid)?;
        if header_bytes != ns.digest.jose_name().as_bytes() {
            return Err(TokenError::Invalid);
        }

        let signature_bytes = decode_segment(signature).map_err(|_| TokenError::Invalid)?;
        let signing_input = &token[..header.len() + 1 + body.len()];
        if !ns
            .digest
            .verify_mac(&ns.key, signing_input.as_bytes(), &signature_bytes)
        {
            return Err(TokenError::Invalid);
        }

        // Signature is good from here on
        let body_bytes = decode_segment(body).map_err(|_| TokenError::Invalid)?;
        let claims: VerifiedClaims<T> =
            serde_json::from_slice(&body_bytes).map_err(|_| TokenError::Invalid)?;

        let max_age = max_age.unwrap_or(claims.max_age);
        let max_age_ms = i64::try_from(max_age.saturating_mul(1000)).unwrap_or(i64::MAX);

        Ok(Verified {
            expired: claims.signed.saturating_add(max_age_ms) < now_ms,
            data: claims.data,
        })
    }
}

/// Split a signed token into its three segments without verifying it
#[must_use]
pub fn segments(token: &str) -> Option<(&str, &str, &str)> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s), None) => Some((h, p, s)),
        _ => None,
    }
}
