//! Signature transport: where the signature half of a token travels
//!
//! With `Bearer` transport the whole `header.payload.signature` token is sent
//! in the `Authorization` header. With `Cookie` transport the header only
//! carries `header.payload`; the `.signature` part lives in an http-only
//! cookie, so script running in the page can never rebuild a working token.

use std::fmt;
use std::str::FromStr;

use actix_web::{http::header::AUTHORIZATION, HttpRequest};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BEARER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^bearer:?\s+(\S+)$").unwrap()
});

/// Where a token's signature segment is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenTransport {
    Bearer,
    Cookie,
}

impl fmt::Display for TokenTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer => write!(f, "bearer"),
            Self::Cookie => write!(f, "cookie"),
        }
    }
}

impl FromStr for TokenTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(Self::Bearer),
            "cookie" => Ok(Self::Cookie),
            other => Err(format!("Unknown token transport: {other}")),
        }
    }
}

/// A token cut into its signed part and its signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitToken {
    pub header_and_payload: String,
    /// Signature segment including its leading `.`
    pub signature: String,
}

/// Parse an `Authorization` header value of the form `Bearer <token>`
///
/// The scheme is matched case-insensitively and may be followed by a colon.
#[must_use]
pub fn parse_bearer(value: &str) -> Option<&str> {
    BEARER_PATTERN
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extract the bearer token from the request's `Authorization` header
#[must_use]
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_bearer)
        .map(ToString::to_string)
}

/// Read a token from the request and infer its transport
///
/// A bearer value together with the named signature cookie means `Cookie`
/// transport and the two are concatenated. A bearer value alone means
/// `Bearer` transport.
#[must_use]
pub fn get_token(req: &HttpRequest, signature_cookie: &str) -> Option<(TokenTransport, String)> {
    let bearer = bearer_token(req)?;

    match req.cookie(signature_cookie) {
        Some(cookie) if !cookie.value().is_empty() => Some((
            TokenTransport::Cookie,
            recombine(&bearer, cookie.value()),
        )),
        _ => Some((TokenTransport::Bearer, bearer)),
    }
}

/// Cut a token before its last `.`
#[must_use]
pub fn split(token: &str) -> Option<SplitToken> {
    let idx = token.rfind('.')?;
    let (header_and_payload, signature) = token.split_at(idx);
    if header_and_payload.is_empty() {
        return None;
    }

    Some(SplitToken {
        header_and_payload: header_and_payload.to_string(),
        signature: signature.to_string(),
    })
}

/// Join a `header.payload` part with a `.signature` part
#[must_use]
pub fn recombine(header_and_payload: &str, signature: &str) -> String {
    format!("{header_and_payload}{signature}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{cookie::Cookie, test::TestRequest};

    #[test]
    fn test_parse_bearer_variants() {
        assert_eq!(parse_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(parse_bearer("bearer abc.def"), Some("abc.def"));
        assert_eq!(parse_bearer("Bearer: abc.def"), Some("abc.def"));
        assert_eq!(parse_bearer("BEARER   abc"), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer a b"), None);
    }

    #[test]
    fn test_split_and_recombine() {
        let parts = split("aaa.bbb.ccc").unwrap();
        assert_eq!(parts.header_and_payload, "aaa.bbb");
        assert_eq!(parts.signature, ".ccc");
        assert_eq!(
            recombine(&parts.header_and_payload, &parts.signature),
            "aaa.bbb.ccc"
        );

        assert!(split("nodots").is_none());
        assert!(split(".ccc").is_none());
    }

    #[test]
    fn test_get_token_bearer_only() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer aaa.bbb.ccc"))
            .to_http_request();

        assert_eq!(
            get_token(&req, "sig"),
            Some((TokenTransport::Bearer, "aaa.bbb.ccc".to_string()))
        );
    }

    #[test]
    fn test_get_token_with_signature_cookie() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer aaa.bbb"))
            .cookie(Cookie::new("sig", ".ccc"))
            .to_http_request();

        assert_eq!(
            get_token(&req, "sig"),
            Some((TokenTransport::Cookie, "aaa.bbb.ccc".to_string()))
        );
    }

    #[test]
    fn test_get_token_absent() {
        // A cookie alone is not enough
        let req = TestRequest::default()
            .cookie(Cookie::new("sig", ".ccc"))
            .to_http_request();
        assert_eq!(get_token(&req, "sig"), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(get_token(&req, "sig"), None);
    }

    #[test]
    fn test_transport_from_str() {
        assert_eq!("Cookie".parse::<TokenTransport>(), Ok(TokenTransport::Cookie));
        assert_eq!("bearer".parse::<TokenTransport>(), Ok(TokenTransport::Bearer));
        assert!("header".parse::<TokenTransport>().is_err());
    }
}
