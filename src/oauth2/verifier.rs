// Bearer JWT verification against a static JSON Web Key Set
// Checks run in order: bearer header, JWT structure, signing key, signature,
// expiry, issuer

use std::future::{ready, Ready};

use actix_web::{
    dev::Payload, http::header::AUTHORIZATION, web::Data, FromRequest, HttpMessage, HttpRequest,
};
use chrono::Utc;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::OAuth2Error;
use super::jwks::{JwtAlgorithm, KeySet};
use crate::token::{codec::segments, parse_bearer};
use crate::utils::crypto::{decode_jwt_payload, decode_segment};

// ============================================================================
// Configuration
// ============================================================================

/// Immutable OAuth2 verifier configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub keyset: KeySet,
    /// Expected `iss` claim, compared exactly
    pub issuer: String,
    /// Algorithm whitelist
    pub algorithms: Vec<JwtAlgorithm>,
    /// Skip signature and claim checks; never enable in production
    pub dummy_verify: bool,
}

impl OAuth2Config {
    #[must_use]
    pub fn new(keyset: KeySet, issuer: &str, algorithms: Vec<JwtAlgorithm>) -> Self {
        Self {
            keyset,
            issuer: issuer.to_string(),
            algorithms,
            dummy_verify: false,
        }
    }

    #[must_use]
    pub const fn with_dummy_verify(mut self, dummy_verify: bool) -> Self {
        self.dummy_verify = dummy_verify;
        self
    }
}

// ============================================================================
// JWT Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct JwtHeader {
    alg: String,
    kid: Option<String>,
}

/// A JWT that passed verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedJwt {
    pub header: Value,
    pub claims: Value,
    /// Raw base64url signature segment
    pub signature: String,
}

impl VerifiedJwt {
    /// The `sub` claim, if present
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }
}

// ============================================================================
// Verifier
// ============================================================================

/// Capability to verify bearer JWTs
pub trait JwtVerifier: Send + Sync {
    /// Verify a raw compact JWT
    ///
    /// # Errors
    ///
    /// Returns the first failed check
    fn verify_token(&self, token: &str) -> Result<VerifiedJwt, OAuth2Error>;

    /// Verify the value of an `Authorization` header
    ///
    /// # Errors
    ///
    /// Returns `OAuth2Error::BearerNotFound` for a missing or malformed header,
    /// otherwise see [`JwtVerifier::verify_token`]
    fn verify(&self, authorization: Option<&str>) -> Result<VerifiedJwt, OAuth2Error> {
        let token = authorization
            .and_then(parse_bearer)
            .ok_or(OAuth2Error::BearerNotFound)?;
        self.verify_token(token)
    }

    /// Verify the request's bearer token and attach the result to the request
    ///
    /// # Errors
    ///
    /// See [`JwtVerifier::verify`]
    fn verify_request(&self, req: &HttpRequest) -> Result<VerifiedJwt, OAuth2Error> {
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let jwt = self
            .verify(authorization)
            .inspect_err(|e| debug!("Bearer JWT rejected for {}: {e}", req.path()))?;
        req.extensions_mut().insert(jwt.clone());
        Ok(jwt)
    }
}

/// Verifies JWTs signed by keys of a static [`KeySet`]
#[derive(Debug, Clone)]
pub struct JwksVerifier {
    config: OAuth2Config,
}

impl JwksVerifier {
    #[must_use]
    pub fn new(config: OAuth2Config) -> Self {
        if config.dummy_verify {
            warn!("⚠️  OAuth2 dummy verification is enabled: JWT signatures will NOT be checked");
        }
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// Verify `token` as of `now` (unix seconds)
    ///
    /// # Errors
    ///
    /// Returns the first failed check
    pub fn verify_token_at(&self, token: &str, now: i64) -> Result<VerifiedJwt, OAuth2Error> {
        if self.config.dummy_verify {
            return Self::dummy_decode(token);
        }

        let (header_b64, claims_b64, signature_b64) =
            segments(token).ok_or(OAuth2Error::CouldNotDecode)?;

        let header_json = decode_segment(header_b64).map_err(|_| OAuth2Error::CouldNotDecode)?;
        let header: Value =
            serde_json::from_slice(&header_json).map_err(|_| OAuth2Error::CouldNotDecode)?;
        let peeked: JwtHeader =
            serde_json::from_value(header.clone()).map_err(|_| OAuth2Error::CouldNotDecode)?;
        let signature = decode_segment(signature_b64).map_err(|_| OAuth2Error::CouldNotDecode)?;

        let key = self
            .config
            .keyset
            .find(peeked.kid.as_deref())
            .ok_or(OAuth2Error::UnknownSigningKey)?;

        let Ok(alg) = peeked.alg.parse::<JwtAlgorithm>() else {
            debug!("JWT uses unsupported algorithm {}", peeked.alg);
            return Err(OAuth2Error::SignatureMismatch);
        };
        if !self.config.algorithms.contains(&alg) {
            debug!("JWT algorithm {alg} is not whitelisted");
            return Err(OAuth2Error::SignatureMismatch);
        }
        if key.jwk.alg.as_deref().is_some_and(|key_alg| key_alg != alg.as_str()) {
            debug!("JWT algorithm {alg} does not match the key's declared algorithm");
            return Err(OAuth2Error::SignatureMismatch);
        }

        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        if !key.material.verify(alg, signing_input.as_bytes(), &signature) {
            return Err(OAuth2Error::SignatureMismatch);
        }

        // Signature is good from here on
        let claims_json = decode_segment(claims_b64).map_err(|_| OAuth2Error::CouldNotDecode)?;
        let claims: Value =
            serde_json::from_slice(&claims_json).map_err(|_| OAuth2Error::CouldNotDecode)?;

        match claims.get("exp").and_then(Value::as_i64) {
            Some(exp) if exp > now => {}
            _ => return Err(OAuth2Error::Expired),
        }

        if claims.get("iss").and_then(Value::as_str) != Some(self.config.issuer.as_str()) {
            return Err(OAuth2Error::IssuerMismatch);
        }

        Ok(VerifiedJwt {
            header,
            claims,
            signature: signature_b64.to_string(),
        })
    }

    fn dummy_decode(token: &str) -> Result<VerifiedJwt, OAuth2Error> {
        warn!("⚠️  Accepting JWT without verification (OAuth2 dummy verification)");

        let claims = decode_jwt_payload(token).map_err(|e| {
            debug!("Dummy JWT decode failed: {e}");
            OAuth2Error::CouldNotDecode
        })?;

        let (header_b64, _, signature_b64) = segments(token).ok_or(OAuth2Error::CouldNotDecode)?;
        let header = decode_segment(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or(Value::Null);

        Ok(VerifiedJwt {
            header,
            claims,
            signature: signature_b64.to_string(),
        })
    }
}

impl JwtVerifier for JwksVerifier {
    fn verify_token(&self, token: &str) -> Result<VerifiedJwt, OAuth2Error> {
        self.verify_token_at(token, Utc::now().timestamp())
    }
}

/// Extractor for handlers behind bearer JWT authentication
///
/// Reuses a JWT already verified on this request, otherwise verifies the
/// bearer token with the registered [`JwksVerifier`].
impl FromRequest for VerifiedJwt {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(jwt) = req.extensions().get::<Self>() {
            return ready(Ok(jwt.clone()));
        }

        let Some(verifier) = req.app_data::<Data<JwksVerifier>>() else {
            error!("VerifiedJwt used without a registered JwksVerifier");
            return ready(Err(actix_web::error::ErrorInternalServerError(
                "server misconfiguration",
            )));
        };

        ready(verifier.verify_request(req).map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::{encode_segment, DigestAlgorithm};
    use actix_web::test::TestRequest;
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::json;

    const ISSUER: &str = "https://issuer.example.com";
    const SECRET: &[u8] = b"oauth2-verifier-test-secret";
    const NOW: i64 = 1_700_000_000;

    fn keyset(keys: &Value) -> KeySet {
        KeySet::from_base64(&general_purpose::STANDARD.encode(keys.to_string())).unwrap()
    }

    fn verifier(algorithms: Vec<JwtAlgorithm>) -> JwksVerifier {
        let keys = json!([{"kty": "oct", "kid": "hmac-1", "k": encode_segment(SECRET)}]);
        JwksVerifier::new(OAuth2Config::new(keyset(&keys), ISSUER, algorithms))
    }

    fn hs_token(alg: &str, digest: DigestAlgorithm, header: &Value, claims: &Value) -> String {
        let mut header = header.clone();
        header["alg"] = json!(alg);
        let input = format!(
            "{}.{}",
            encode_segment(header.to_string().as_bytes()),
            encode_segment(claims.to_string().as_bytes())
        );
        let signature = encode_segment(&digest.mac(SECRET, input.as_bytes()));
        format!("{input}.{signature}")
    }

    fn hs256(claims: &Value) -> String {
        hs_token("HS256", DigestAlgorithm::Sha256, &json!({"kid": "hmac-1"}), claims)
    }

    fn claims(exp: i64) -> Value {
        json!({"iss": ISSUER, "exp": exp, "sub": "client-1", "scope": "read"})
    }

    #[test]
    fn test_valid_token() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);
        let jwt = verifier.verify_token_at(&hs256(&claims(NOW + 60)), NOW).unwrap();

        assert_eq!(jwt.subject(), Some("client-1"));
        assert_eq!(jwt.header["kid"], "hmac-1");
        assert!(!jwt.signature.is_empty());
    }

    #[test]
    fn test_expiry_boundaries() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);

        assert!(verifier.verify_token_at(&hs256(&claims(NOW + 1)), NOW).is_ok());
        assert_eq!(
            verifier.verify_token_at(&hs256(&claims(NOW)), NOW).unwrap_err(),
            OAuth2Error::Expired
        );
        assert_eq!(
            verifier.verify_token_at(&hs256(&claims(NOW - 1)), NOW).unwrap_err(),
            OAuth2Error::Expired
        );

        let float_exp = json!({"iss": ISSUER, "exp": 1.9e10});
        assert_eq!(
            verifier.verify_token_at(&hs256(&float_exp), NOW).unwrap_err(),
            OAuth2Error::Expired
        );
    }

    #[test]
    fn test_algorithm_must_be_whitelisted() {
        let verifier = verifier(vec![JwtAlgorithm::Hs512]);
        let token = hs256(&claims(NOW + 60));

        assert_eq!(
            verifier.verify_token_at(&token, NOW).unwrap_err(),
            OAuth2Error::SignatureMismatch
        );
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);
        let header = encode_segment(br#"{"alg":"none","kid":"hmac-1"}"#);
        let body = encode_segment(claims(NOW + 60).to_string().as_bytes());
        let token = format!("{header}.{body}.");

        assert_eq!(
            verifier.verify_token_at(&token, NOW).unwrap_err(),
            OAuth2Error::SignatureMismatch
        );
    }

    #[test]
    fn test_issuer_mismatch() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);
        let token = hs256(&json!({"iss": "https://evil.example.com", "exp": NOW + 60}));

        assert_eq!(
            verifier.verify_token_at(&token, NOW).unwrap_err(),
            OAuth2Error::IssuerMismatch
        );
    }

    #[test]
    fn test_unknown_kid_and_garbage() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);
        let token = hs_token(
            "HS256",
            DigestAlgorithm::Sha256,
            &json!({"kid": "other"}),
            &claims(NOW + 60),
        );

        assert_eq!(
            verifier.verify_token_at(&token, NOW).unwrap_err(),
            OAuth2Error::UnknownSigningKey
        );
        for garbage in ["", "abc", "a.b", "!!.??.**", "e30.e30"] {
            assert_eq!(
                verifier.verify_token_at(garbage, NOW).unwrap_err(),
                OAuth2Error::CouldNotDecode,
                "token {garbage:?}"
            );
        }
    }

    #[test]
    fn test_kidless_token_with_single_key() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);
        let token = hs_token("HS256", DigestAlgorithm::Sha256, &json!({}), &claims(NOW + 60));

        assert!(verifier.verify_token_at(&token, NOW).is_ok());
    }

    #[test]
    fn test_tampered_claims() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);
        let token = hs256(&claims(NOW + 60));
        let (header, _, signature) = segments(&token).unwrap();
        let forged_claims = json!({"iss": ISSUER, "exp": NOW + 60, "sub": "admin"});
        let forged = format!(
            "{header}.{}.{signature}",
            encode_segment(forged_claims.to_string().as_bytes())
        );

        assert_eq!(
            verifier.verify_token_at(&forged, NOW).unwrap_err(),
            OAuth2Error::SignatureMismatch
        );
    }

    #[test]
    fn test_dummy_verify_only_decodes() {
        let keys = json!([{"kty": "oct", "kid": "hmac-1", "k": encode_segment(SECRET)}]);
        let verifier = JwksVerifier::new(
            OAuth2Config::new(keyset(&keys), ISSUER, vec![JwtAlgorithm::Hs256])
                .with_dummy_verify(true),
        );
        let header = encode_segment(br#"{"alg":"none"}"#);
        let body = encode_segment(br#"{"sub":"anyone","exp":1}"#);

        let jwt = verifier
            .verify_token_at(&format!("{header}.{body}.bogus"), NOW)
            .unwrap();
        assert_eq!(jwt.subject(), Some("anyone"));
        assert_eq!(
            verifier.verify(None).unwrap_err(),
            OAuth2Error::BearerNotFound
        );
    }

    #[test]
    fn test_bearer_parsing() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);

        assert_eq!(
            verifier.verify(Some("Basic abc")).unwrap_err(),
            OAuth2Error::BearerNotFound
        );
        assert_eq!(
            verifier.verify(None).unwrap_err(),
            OAuth2Error::BearerNotFound
        );
    }

    #[actix_web::test]
    async fn test_extractor_uses_registered_verifier() {
        let verifier = verifier(vec![JwtAlgorithm::Hs256]);
        let token = hs256(&claims(Utc::now().timestamp() + 300));
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, format!("bearer: {token}")))
            .app_data(Data::new(verifier))
            .to_http_request();

        let jwt = VerifiedJwt::extract(&req).await.unwrap();
        assert_eq!(jwt.subject(), Some("client-1"));
        assert!(req.extensions().get::<VerifiedJwt>().is_some());
    }
}
