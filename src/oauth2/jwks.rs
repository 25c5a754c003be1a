// Static JSON Web Key Set, decoded once from configuration
//
// The configured value is base64 text wrapping either a bare JSON array of
// keys or an object `{"keys": [...]}`. Every key is turned into verification
// material up front, so a broken key fails at startup rather than per request.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use log::debug;
use p256::{ecdsa::VerifyingKey as EcdsaVerifyingKey, EncodedPoint};
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::crypto::{decode_segment, DigestAlgorithm};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeySetError {
    #[error("keyset is not valid base64: {0}")]
    InvalidEncoding(String),
    #[error("keyset is not a JSON list of keys: {0}")]
    InvalidJson(String),
    #[error("keyset contains no keys")]
    Empty,
    #[error("key {kid}: {reason}")]
    InvalidKey { kid: String, reason: String },
    #[error("duplicate key id {0}")]
    DuplicateKid(String),
}

// ============================================================================
// Algorithms
// ============================================================================

/// JWS algorithms this crate can verify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    #[serde(rename = "RS256")]
    Rs256,
    #[serde(rename = "RS384")]
    Rs384,
    #[serde(rename = "RS512")]
    Rs512,
    #[serde(rename = "ES256")]
    Es256,
    #[serde(rename = "HS256")]
    Hs256,
    #[serde(rename = "HS384")]
    Hs384,
    #[serde(rename = "HS512")]
    Hs512,
}

impl JwtAlgorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Es256 => "ES256",
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }
}

impl fmt::Display for JwtAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JwtAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RS256" => Ok(Self::Rs256),
            "RS384" => Ok(Self::Rs384),
            "RS512" => Ok(Self::Rs512),
            "ES256" => Ok(Self::Es256),
            "HS256" => Ok(Self::Hs256),
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            other => Err(format!("Unsupported JWT algorithm: {other}")),
        }
    }
}

// ============================================================================
// JWKS Structures
// ============================================================================

#[derive(Clone, Deserialize, Serialize)]
pub struct JsonWebKey {
    pub kty: String,         // Key type (RSA, EC, oct)
    pub kid: Option<String>, // Key ID
    pub alg: Option<String>, // Algorithm (RS256, ES256, etc.)
    #[serde(rename = "use")]
    pub key_use: Option<String>, // "sig" for signing

    // RSA keys
    pub n: Option<String>, // Modulus
    pub e: Option<String>, // Exponent

    // EC keys
    pub crv: Option<String>, // Curve
    pub x: Option<String>,   // X coordinate
    pub y: Option<String>,   // Y coordinate

    // Symmetric keys
    pub k: Option<String>,
}

impl fmt::Debug for JsonWebKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonWebKey")
            .field("kty", &self.kty)
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .field("key_use", &self.key_use)
            .field("n", &self.n)
            .field("e", &self.e)
            .field("crv", &self.crv)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("k", &self.k.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyList {
    Bare(Vec<JsonWebKey>),
    Set { keys: Vec<JsonWebKey> },
}

/// Decoded verification material of one key
#[derive(Clone)]
pub enum KeyMaterial {
    Rsa(RsaPublicKey),
    Ec(EcdsaVerifyingKey),
    Hmac(Vec<u8>),
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa(_) => f.write_str("Rsa(..)"),
            Self::Ec(_) => f.write_str("Ec(..)"),
            Self::Hmac(_) => f.write_str("Hmac(<redacted>)"),
        }
    }
}

impl KeyMaterial {
    /// Whether `alg` can be verified with this kind of key
    #[must_use]
    pub const fn supports(&self, alg: JwtAlgorithm) -> bool {
        match self {
            Self::Rsa(_) => matches!(
                alg,
                JwtAlgorithm::Rs256 | JwtAlgorithm::Rs384 | JwtAlgorithm::Rs512
            ),
            Self::Ec(_) => matches!(alg, JwtAlgorithm::Es256),
            Self::Hmac(_) => matches!(
                alg,
                JwtAlgorithm::Hs256 | JwtAlgorithm::Hs384 | JwtAlgorithm::Hs512
            ),
        }
    }

    /// Verify `signature` over `signing_input` with `alg`
    ///
    /// Returns `false` for any mismatch, including an incompatible `alg`.
    #[must_use]
    pub fn verify(&self, alg: JwtAlgorithm, signing_input: &[u8], signature: &[u8]) -> bool {
        match (self, alg) {
            (Self::Rsa(key), JwtAlgorithm::Rs256 | JwtAlgorithm::Rs384 | JwtAlgorithm::Rs512) => {
                verify_rsa(key, alg, signing_input, signature)
            }
            (Self::Ec(key), JwtAlgorithm::Es256) => verify_es256(key, signing_input, signature),
            (Self::Hmac(secret), JwtAlgorithm::Hs256) => {
                DigestAlgorithm::Sha256.verify_mac(secret, signing_input, signature)
            }
            (Self::Hmac(secret), JwtAlgorithm::Hs384) => {
                DigestAlgorithm::Sha384.verify_mac(secret, signing_input, signature)
            }
            (Self::Hmac(secret), JwtAlgorithm::Hs512) => {
                DigestAlgorithm::Sha512.verify_mac(secret, signing_input, signature)
            }
            _ => false,
        }
    }
}

fn verify_rsa(
    key: &RsaPublicKey,
    alg: JwtAlgorithm,
    signing_input: &[u8],
    signature: &[u8],
) -> bool {
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::signature::Verifier;

    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };

    let result = match alg {
        JwtAlgorithm::Rs256 => {
            VerifyingKey::<sha2::Sha256>::new(key.clone()).verify(signing_input, &signature)
        }
        JwtAlgorithm::Rs384 => {
            VerifyingKey::<sha2::Sha384>::new(key.clone()).verify(signing_input, &signature)
        }
        JwtAlgorithm::Rs512 => {
            VerifyingKey::<sha2::Sha512>::new(key.clone()).verify(signing_input, &signature)
        }
        _ => return false,
    };
    result.is_ok()
}

fn verify_es256(key: &EcdsaVerifyingKey, signing_input: &[u8], signature: &[u8]) -> bool {
    use p256::ecdsa::signature::Verifier;

    // JWS carries the raw r || s form, not DER
    let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
        return false;
    };
    key.verify(signing_input, &signature).is_ok()
}

/// A key of the set together with its decoded material
#[derive(Debug, Clone)]
pub struct StoredKey {
    pub jwk: JsonWebKey,
    pub material: KeyMaterial,
}

/// Immutable `kid -> key` map, plus the keys that declare no `kid`
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: HashMap<String, StoredKey>,
    kidless: Vec<StoredKey>,
}

impl KeySet {
    /// Decode a base64 (standard or url-safe) JSON keyset
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not base64 JSON, holds no keys, or any
    /// key cannot be decoded
    pub fn from_base64(encoded: &str) -> Result<Self, KeySetError> {
        let trimmed = encoded.trim();
        let json = general_purpose::STANDARD
            .decode(trimmed)
            .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(trimmed))
            .map_err(|e| KeySetError::InvalidEncoding(e.to_string()))?;

        Self::from_json(&json)
    }

    /// Decode a JSON keyset
    ///
    /// # Errors
    ///
    /// See [`KeySet::from_base64`]
    pub fn from_json(json: &[u8]) -> Result<Self, KeySetError> {
        let list: KeyList =
            serde_json::from_slice(json).map_err(|e| KeySetError::InvalidJson(e.to_string()))?;
        let jwks = match list {
            KeyList::Bare(keys) | KeyList::Set { keys } => keys,
        };

        Self::from_keys(jwks)
    }

    /// Build a keyset from already parsed keys
    ///
    /// Keys without a `kid` are only reachable by tokens without one.
    ///
    /// # Errors
    ///
    /// See [`KeySet::from_base64`]; also rejects two keys sharing a `kid`
    pub fn from_keys(jwks: Vec<JsonWebKey>) -> Result<Self, KeySetError> {
        if jwks.is_empty() {
            return Err(KeySetError::Empty);
        }

        let mut keys = HashMap::with_capacity(jwks.len());
        let mut kidless = Vec::new();
        for (index, jwk) in jwks.into_iter().enumerate() {
            let material = decode_material(&jwk).map_err(|reason| KeySetError::InvalidKey {
                kid: jwk.kid.clone().unwrap_or_else(|| format!("#{index}")),
                reason,
            })?;

            match jwk.kid.clone() {
                Some(kid) if keys.contains_key(&kid) => {
                    return Err(KeySetError::DuplicateKid(kid));
                }
                Some(kid) => {
                    keys.insert(kid, StoredKey { jwk, material });
                }
                None => kidless.push(StoredKey { jwk, material }),
            }
        }

        let set = Self { keys, kidless };
        debug!("Loaded {} JSON web keys", set.len());
        Ok(set)
    }

    /// Find the key for a token's `kid`
    ///
    /// A token without `kid` only matches a set holding a single key.
    #[must_use]
    pub fn find(&self, kid: Option<&str>) -> Option<&StoredKey> {
        match kid {
            Some(kid) => self.keys.get(kid),
            None if self.len() == 1 => self.keys.values().chain(&self.kidless).next(),
            None => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len() + self.kidless.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.kidless.is_empty()
    }
}

fn decode_field(value: Option<&String>, name: &str) -> Result<Vec<u8>, String> {
    let value = value.ok_or_else(|| format!("missing '{name}'"))?;
    decode_segment(value).map_err(|e| format!("invalid '{name}' encoding: {e}"))
}

fn decode_material(jwk: &JsonWebKey) -> Result<KeyMaterial, String> {
    match jwk.kty.as_str() {
        "RSA" => {
            let n = decode_field(jwk.n.as_ref(), "n")?;
            let e = decode_field(jwk.e.as_ref(), "e")?;
            RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
                .map(KeyMaterial::Rsa)
                .map_err(|e| format!("invalid RSA key: {e}"))
        }
        "EC" => {
            if jwk.crv.as_deref() != Some("P-256") {
                return Err(format!("unsupported curve {:?}", jwk.crv));
            }
            let x = decode_field(jwk.x.as_ref(), "x")?;
            let y = decode_field(jwk.y.as_ref(), "y")?;

            // Uncompressed SEC1 point: 0x04 || x || y
            let mut point_bytes = Vec::with_capacity(1 + x.len() + y.len());
            point_bytes.push(0x04);
            point_bytes.extend_from_slice(&x);
            point_bytes.extend_from_slice(&y);

            let point =
                EncodedPoint::from_bytes(&point_bytes).map_err(|e| format!("invalid EC point: {e}"))?;
            EcdsaVerifyingKey::from_encoded_point(&point)
                .map(KeyMaterial::Ec)
                .map_err(|e| format!("invalid EC key: {e}"))
        }
        "oct" => {
            let k = decode_field(jwk.k.as_ref(), "k")?;
            if k.is_empty() {
                return Err("empty symmetric key".to_string());
            }
            Ok(KeyMaterial::Hmac(k))
        }
        other => Err(format!("unsupported key type {other}")),
    }
}
