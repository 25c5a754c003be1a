//! HTTP request builders for testing guarded endpoints
//!
//! Builders place tokens where clients would: the `authorization` header and,
//! for cookie transport, the matching signature cookie.

use std::net::SocketAddr;

use actix_web::cookie::Cookie;
use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
use actix_web::http::Method;
use actix_web::{test, HttpRequest};
use serde_json::Value;

use super::constants::{ACCESS_SIGNATURE_COOKIE, REFRESH_SIGNATURE_COOKIE};
use crate::session::IssuedTokens;
use crate::token::TokenTransport;

enum Body {
    Json(Value),
    Raw(Vec<u8>),
}

/// Builder for creating HTTP requests for testing
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
    peer_addr: Option<SocketAddr>,
    body: Option<Body>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// Create a new request builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            peer_addr: None,
            body: None,
        }
    }

    /// Set the HTTP method
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request URI
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set `authorization: Bearer <token>`
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }

    /// Add a cookie to the request
    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(Cookie::new(name.to_string(), value.to_string()));
        self
    }

    /// Set the client address seen by the server
    ///
    /// # Panics
    ///
    /// Panics if `ip` is not a valid IP address
    #[must_use]
    pub fn with_client_ip(mut self, ip: &str) -> Self {
        self.peer_addr = Some(SocketAddr::new(ip.parse().unwrap(), 40_000));
        self
    }

    /// Set a JSON body
    #[must_use]
    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    /// Set raw body bytes, as signed by HMAC clients
    #[must_use]
    pub fn raw_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(Body::Raw(body));
        self
    }

    /// Build the underlying `TestRequest`, for `test::call_service`
    #[must_use]
    pub fn into_test_request(self) -> test::TestRequest {
        let mut req = test::TestRequest::default()
            .method(self.method)
            .uri(&self.uri);

        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        for cookie in self.cookies {
            req = req.cookie(cookie);
        }

        if let Some(addr) = self.peer_addr {
            req = req.peer_addr(addr);
        }

        match self.body {
            Some(Body::Json(body)) => req.set_json(body),
            Some(Body::Raw(body)) => req
                .insert_header((CONTENT_TYPE, "application/json"))
                .set_payload(body),
            None => req,
        }
    }

    /// Build the final `HttpRequest`
    #[must_use]
    pub fn build(self) -> HttpRequest {
        self.into_test_request().to_http_request()
    }
}

/// Quick builders for requests carrying issued tokens
impl RequestBuilder {
    /// Request presenting the access token of `tokens`
    #[must_use]
    pub fn with_access_token(tokens: &IssuedTokens) -> Self {
        Self::with_token(&tokens.access_token, tokens, ACCESS_SIGNATURE_COOKIE)
    }

    /// Request presenting the refresh token of `tokens`
    #[must_use]
    pub fn with_refresh_token(tokens: &IssuedTokens) -> Self {
        Self::with_token(&tokens.refresh_token, tokens, REFRESH_SIGNATURE_COOKIE)
            .method(Method::POST)
    }

    fn with_token(token: &str, tokens: &IssuedTokens, cookie_name: &str) -> Self {
        let builder = Self::new().bearer(token);
        if tokens.session.token_signature_transport == TokenTransport::Bearer {
            return builder;
        }

        match tokens.cookies.iter().find(|c| c.name() == cookie_name) {
            Some(cookie) => builder.with_cookie(cookie_name, cookie.value()),
            None => builder,
        }
    }
}
