//! Signing helpers playing the client or authorization server side

use serde_json::{json, Value};

use super::constants::TEST_HMAC_SECRET;
use crate::hmac_verification::sign_body;
use crate::utils::crypto::DigestAlgorithm;

/// JSON body in the shape HMAC clients sign
#[must_use]
pub fn hmac_body(path: &str, method: &str, timestamp: i64, contents: &Value) -> Vec<u8> {
    json!({
        "path": path,
        "method": method,
        "timestamp": timestamp,
        "contents": contents,
    })
    .to_string()
    .into_bytes()
}

/// Authorization header value for `body` under the test HMAC secret
#[must_use]
pub fn hmac_signature(body: &[u8]) -> String {
    sign_body(TEST_HMAC_SECRET, body, DigestAlgorithm::Sha256)
}

#[cfg(feature = "oauth2")]
pub use jwt::*;

#[cfg(feature = "oauth2")]
mod jwt {
    use base64::{engine::general_purpose, Engine as _};
    use p256::ecdsa::{signature::Signer, Signature, SigningKey};
    use serde_json::{json, Value};

    use crate::oauth2::JsonWebKey;
    use crate::utils::crypto::{encode_segment, DigestAlgorithm};

    // Fixed P-256 scalar so keys and tokens are reproducible
    const ES256_TEST_SCALAR: [u8; 32] = [
        0x1f, 0x6b, 0x2c, 0x4e, 0x90, 0x33, 0x7a, 0x51, 0xc4, 0x08, 0xde, 0x62, 0x9b, 0x15,
        0x47, 0xa3, 0x2d, 0x88, 0x0c, 0xf1, 0x56, 0x6e, 0xb9, 0x04, 0x73, 0xaa, 0x3f, 0x19,
        0xe2, 0x5d, 0x81, 0x37,
    ];

    /// Compact JWS over `header` and `claims`, signed by `sign`
    pub fn compact_jwt(header: &Value, claims: &Value, sign: impl Fn(&[u8]) -> Vec<u8>) -> String {
        let signing_input = format!(
            "{}.{}",
            encode_segment(header.to_string().as_bytes()),
            encode_segment(claims.to_string().as_bytes())
        );
        let signature = sign(signing_input.as_bytes());
        format!("{signing_input}.{}", encode_segment(&signature))
    }

    /// ES256 key pair standing in for an authorization server
    pub struct Es256TestKey {
        kid: String,
        key: SigningKey,
    }

    impl Es256TestKey {
        /// # Panics
        ///
        /// Panics if the fixed scalar is not a valid P-256 private key
        #[must_use]
        pub fn new(kid: &str) -> Self {
            Self {
                kid: kid.to_string(),
                key: SigningKey::from_slice(&ES256_TEST_SCALAR).unwrap(),
            }
        }

        #[must_use]
        pub fn kid(&self) -> &str {
            &self.kid
        }

        /// Public half as a JWK
        ///
        /// # Panics
        ///
        /// Panics if the public point has no affine coordinates
        #[must_use]
        pub fn jwk(&self) -> JsonWebKey {
            let point = self.key.verifying_key().to_encoded_point(false);
            JsonWebKey {
                kty: "EC".to_string(),
                kid: Some(self.kid.clone()),
                alg: Some("ES256".to_string()),
                key_use: Some("sig".to_string()),
                n: None,
                e: None,
                crv: Some("P-256".to_string()),
                x: Some(encode_segment(point.x().unwrap())),
                y: Some(encode_segment(point.y().unwrap())),
                k: None,
            }
        }

        /// Sign `claims` with a header naming this key
        #[must_use]
        pub fn sign(&self, claims: &Value) -> String {
            self.sign_with_header(&json!({"alg": "ES256", "typ": "JWT", "kid": self.kid}), claims)
        }

        #[must_use]
        pub fn sign_with_header(&self, header: &Value, claims: &Value) -> String {
            compact_jwt(header, claims, |input| {
                let signature: Signature = self.key.sign(input);
                signature.to_bytes().to_vec()
            })
        }
    }

    /// Symmetric JWK holding `secret`
    #[must_use]
    pub fn oct_jwk(kid: &str, alg: Option<&str>, secret: &[u8]) -> JsonWebKey {
        JsonWebKey {
            kty: "oct".to_string(),
            kid: Some(kid.to_string()),
            alg: alg.map(ToString::to_string),
            key_use: Some("sig".to_string()),
            n: None,
            e: None,
            crv: None,
            x: None,
            y: None,
            k: Some(encode_segment(secret)),
        }
    }

    /// HS256 token for `claims` under `secret`
    #[must_use]
    pub fn sign_hs256(kid: &str, secret: &[u8], claims: &Value) -> String {
        compact_jwt(
            &json!({"alg": "HS256", "typ": "JWT", "kid": kid}),
            claims,
            |input| DigestAlgorithm::Sha256.mac(secret, input),
        )
    }

    /// Base64 JWKS document, the format of the `oauth2.keyset` setting
    ///
    /// # Panics
    ///
    /// Panics if a key fails to serialize
    #[must_use]
    pub fn keyset_base64(keys: &[JsonWebKey]) -> String {
        let document = json!({ "keys": keys });
        general_purpose::STANDARD.encode(serde_json::to_vec(&document).unwrap())
    }
}
