//! HMAC verification of signed request bodies
//!
//! The client sends a JSON body
//! `{"path": .., "method": .., "timestamp": <unix seconds>, "contents": ..}`
//! and the base64 MAC of those exact bytes in the `authorization` header.
//! Binding path, method and time into the signed body stops a captured
//! request from being replayed on another endpoint, method or later on.

use std::future::Future;
use std::pin::Pin;

use actix_web::{
    dev::Payload,
    http::header::{HeaderMap, AUTHORIZATION},
    web::{Bytes, Data},
    FromRequest, HttpMessage, HttpRequest,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::HmacError;
use crate::utils::crypto::DigestAlgorithm;

pub const DEFAULT_MAX_AGE_SECONDS: u64 = 120;

/// Immutable HMAC verifier configuration
#[derive(Clone)]
pub struct HmacConfig {
    pub secret: String,
    pub algorithm: DigestAlgorithm,
    /// Seconds a signed body stays acceptable after its timestamp
    pub max_age: u64,
}

impl std::fmt::Debug for HmacConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl HmacConfig {
    /// Configuration with sha256 and the default max age
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            algorithm: DigestAlgorithm::default(),
            max_age: DEFAULT_MAX_AGE_SECONDS,
        }
    }

    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub const fn with_max_age(mut self, max_age: u64) -> Self {
        self.max_age = max_age;
        self
    }
}

/// A verified request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedBody {
    pub path: String,
    pub method: String,
    pub timestamp: i64,
    pub contents: Value,
}

/// Base64 MAC of `body`, the value clients send in the `authorization` header
#[must_use]
pub fn sign_body(secret: &str, body: &[u8], algorithm: DigestAlgorithm) -> String {
    general_purpose::STANDARD.encode(algorithm.mac(secret.as_bytes(), body))
}

/// Verify a signed request body against the current time
///
/// # Errors
///
/// Returns the first failed check, in order: header, MAC, path, method,
/// timestamp
pub fn verify(
    raw_body: &[u8],
    headers: &HeaderMap,
    path: &str,
    method: &str,
    config: &HmacConfig,
) -> Result<SignedBody, HmacError> {
    verify_at(raw_body, headers, path, method, config, Utc::now().timestamp())
}

/// Verify a signed request body at `now` (unix seconds)
///
/// # Errors
///
/// See [`verify`]
pub fn verify_at(
    raw_body: &[u8],
    headers: &HeaderMap,
    path: &str,
    method: &str,
    config: &HmacConfig,
    now: i64,
) -> Result<SignedBody, HmacError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(HmacError::MissingAuthorizationHeader)?;

    let header = header.to_str().map_err(|e| {
        error!("HMAC authorization header is not visible ASCII: {e}");
        HmacError::Unknown
    })?;
    let mac = general_purpose::STANDARD.decode(header.trim()).map_err(|e| {
        error!("HMAC authorization header is not valid base64: {e}");
        HmacError::Unknown
    })?;

    if !config
        .algorithm
        .verify_mac(config.secret.as_bytes(), raw_body, &mac)
    {
        return Err(HmacError::HashMismatch);
    }

    let fields = parse_body(raw_body)?;

    match fields.get("path") {
        None | Some(Value::Null) => return Err(HmacError::PathMissing),
        Some(Value::String(signed)) if signed == path => {}
        Some(_) => return Err(HmacError::PathMismatch),
    }

    match fields.get("method") {
        None | Some(Value::Null) => return Err(HmacError::MethodMissing),
        Some(Value::String(signed)) if signed == method => {}
        Some(_) => return Err(HmacError::MethodMismatch),
    }

    let timestamp = match fields.get("timestamp") {
        None | Some(Value::Null) => return Err(HmacError::TimestampMissing),
        Some(value) => value.as_i64().ok_or_else(|| {
            error!("HMAC body timestamp is not an integer: {value}");
            HmacError::Unknown
        })?,
    };

    let max_age = i64::try_from(config.max_age).unwrap_or(i64::MAX);
    if timestamp.saturating_add(max_age) < now {
        debug!("HMAC body signed at {timestamp} expired (now {now}, max age {max_age}s)");
        return Err(HmacError::Expired);
    }

    Ok(SignedBody {
        path: path.to_string(),
        method: method.to_string(),
        timestamp,
        contents: fields.get("contents").cloned().unwrap_or(Value::Null),
    })
}

fn parse_body(raw_body: &[u8]) -> Result<Map<String, Value>, HmacError> {
    match serde_json::from_slice::<Value>(raw_body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => {
            error!("HMAC signed body is not a JSON object: {other}");
            Err(HmacError::Unknown)
        }
        Err(e) => {
            error!("HMAC signed body is not valid JSON: {e}");
            Err(HmacError::Unknown)
        }
    }
}

/// Request-level verifier, registered as app data
#[derive(Debug, Clone)]
pub struct HmacVerifier {
    config: HmacConfig,
}

impl HmacVerifier {
    #[must_use]
    pub const fn new(config: HmacConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &HmacConfig {
        &self.config
    }

    /// Verify `body` as sent with `req` and attach the result to the request
    ///
    /// # Errors
    ///
    /// See [`verify`]
    pub fn verify_request(&self, req: &HttpRequest, body: &[u8]) -> Result<SignedBody, HmacError> {
        let signed = verify(
            body,
            req.headers(),
            req.path(),
            req.method().as_str(),
            &self.config,
        )
        .inspect_err(|e| debug!("HMAC verification failed for {}: {e}", req.path()))?;

        req.extensions_mut().insert(signed.clone());
        Ok(signed)
    }
}

/// Extractor that reads the raw body and verifies it with the registered
/// [`HmacVerifier`]
#[derive(Debug, Clone)]
pub struct HmacSignedBody(pub SignedBody);

impl FromRequest for HmacSignedBody {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let body = Bytes::from_request(&req, payload);

        Box::pin(async move {
            let body = body.await?;
            let Some(verifier) = req.app_data::<Data<HmacVerifier>>() else {
                error!("HmacSignedBody used without a registered HmacVerifier");
                return Err(HmacError::Unknown.into());
            };

            Ok(Self(verifier.verify_request(&req, &body)?))
        })
    }
}
