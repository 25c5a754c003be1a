// Cryptographic helpers shared by the token codec and the request verifiers

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use hmac::{digest::KeyInit, Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Generate a cryptographically secure nonce of specified byte length
///
/// # Returns
///
/// A base64url-encoded string representing the specified bytes of random data
#[must_use]
pub fn generate_nonce(length: usize) -> String {
    let mut nonce = vec![0u8; length];
    rand::rng().fill_bytes(&mut nonce);
    general_purpose::URL_SAFE_NO_PAD.encode(nonce)
}

/// Digest algorithms usable for HMAC signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// JOSE-style algorithm name written into token headers
    #[must_use]
    pub const fn jose_name(self) -> &'static str {
        match self {
            Self::Sha256 => "HS256",
            Self::Sha384 => "HS384",
            Self::Sha512 => "HS512",
        }
    }

    /// Compute the HMAC of `message` under `key`
    #[must_use]
    pub fn mac(self, key: &[u8], message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => compute_mac::<HmacSha256>(key, message),
            Self::Sha384 => compute_mac::<HmacSha384>(key, message),
            Self::Sha512 => compute_mac::<HmacSha512>(key, message),
        }
    }

    /// Verify an HMAC in constant time
    #[must_use]
    pub fn verify_mac(self, key: &[u8], message: &[u8], expected: &[u8]) -> bool {
        match self {
            Self::Sha256 => check_mac::<HmacSha256>(key, message, expected),
            Self::Sha384 => check_mac::<HmacSha384>(key, message, expected),
            Self::Sha512 => check_mac::<HmacSha512>(key, message, expected),
        }
    }
}

fn compute_mac<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Vec<u8> {
    // HMAC pads or hashes keys of any length, so an empty MAC is never produced
    <M as Mac>::new_from_slice(key).map_or_else(
        |_| Vec::new(),
        |mut mac| {
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        },
    )
}

fn check_mac<M: Mac + KeyInit>(key: &[u8], message: &[u8], expected: &[u8]) -> bool {
    <M as Mac>::new_from_slice(key)
        .map(|mut mac| {
            mac.update(message);
            mac.verify_slice(expected).is_ok()
        })
        .unwrap_or(false)
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha384 => write!(f, "sha384"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(format!("Unsupported digest algorithm: {other}")),
        }
    }
}

/// Encode bytes as unpadded base64url
#[must_use]
pub fn encode_segment(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode an unpadded base64url segment
///
/// # Errors
///
/// Returns an error if the segment is not valid base64url
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(segment)
}

/// Helper function to decode a JWT payload without verification
///
/// # Errors
///
/// Returns an error if:
/// - The JWT format is invalid (not 3 parts separated by dots)
/// - Base64 decoding fails
/// - JSON parsing fails
pub fn decode_jwt_payload(token: &str) -> Result<serde_json::Value, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid JWT format".to_string());
    }

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .or_else(|_| general_purpose::STANDARD.decode(parts[1]))
        .map_err(|_| "Base64 decode failed")?;

    serde_json::from_slice(&payload_bytes).map_err(|_| "JSON parse failed".to_string())
}
