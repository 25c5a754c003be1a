use actix_web::{
    http::header::{HeaderName, HeaderValue},
    middleware::DefaultHeaders,
    HttpResponse,
};

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; frame-ancestors 'none'";

/// Security headers added to every API response
///
/// Headers a handler already set are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeaders {
    /// `max-age` of `strict-transport-security`; no HSTS header when `None`
    pub hsts_max_age: Option<u64>,
}

impl SecurityHeaders {
    #[must_use]
    pub const fn new(hsts_max_age: Option<u64>) -> Self {
        Self { hsts_max_age }
    }

    /// Header name/value pairs this policy applies
    #[must_use]
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("x-content-type-options", "nosniff".to_string()),
            ("x-frame-options", "DENY".to_string()),
            ("x-xss-protection", "0".to_string()),
            ("referrer-policy", "no-referrer".to_string()),
            ("content-security-policy", CONTENT_SECURITY_POLICY.to_string()),
        ];
        if let Some(max_age) = self.hsts_max_age {
            headers.push((
                "strict-transport-security",
                format!("max-age={max_age}; includeSubDomains"),
            ));
        }
        headers
    }

    /// Middleware form, for `App::wrap`
    #[must_use]
    pub fn middleware(&self) -> DefaultHeaders {
        self.headers()
            .into_iter()
            .fold(DefaultHeaders::new(), |mw, header| mw.add(header))
    }

    /// Apply the headers to a single response
    pub fn apply(&self, response: &mut HttpResponse) {
        let headers = response.headers_mut();
        for (name, value) in self.headers() {
            let name = HeaderName::from_static(name);
            if headers.contains_key(&name) {
                continue;
            }
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(name, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    #[::core::prelude::v1::test]
    fn test_apply_keeps_existing_headers() {
        let mut response = HttpResponse::Ok()
            .insert_header(("x-frame-options", "SAMEORIGIN"))
            .finish();

        SecurityHeaders::new(None).apply(&mut response);

        let headers = response.headers();
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert!(headers.get("strict-transport-security").is_none());
    }

    #[::core::prelude::v1::test]
    fn test_hsts_when_configured() {
        let mut response = HttpResponse::Ok().finish();
        SecurityHeaders::new(Some(31_536_000)).apply(&mut response);

        assert_eq!(
            response.headers().get("strict-transport-security").unwrap(),
            "max-age=31536000; includeSubDomains"
        );
    }

    #[actix_web::test]
    async fn test_middleware() {
        let app = test::init_service(
            App::new()
                .wrap(SecurityHeaders::new(Some(60)).middleware())
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let response = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(response.headers().get("referrer-policy").unwrap(), "no-referrer");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            CONTENT_SECURITY_POLICY
        );
        assert!(response.headers().contains_key("strict-transport-security"));
    }
}
