use actix_web::cookie::{time::Duration, Cookie, SameSite};

use super::config::SessionConfig;

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            max_age: Duration::ZERO,
        }
    }
}

/// Builds the two signature cookies of cookie-transport sessions
///
/// The access signature cookie is sent on every path; the refresh signature
/// cookie only reaches the refresh endpoint.
#[derive(Debug, Clone)]
pub struct CookieFactory {
    access_cookie: String,
    refresh_cookie: String,
    refresh_path: String,
}

impl CookieFactory {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            access_cookie: config.access_signature_cookie.clone(),
            refresh_cookie: config.refresh_signature_cookie.clone(),
            refresh_path: config.refresh_path.clone(),
        }
    }

    /// Generic method to create a cookie
    #[must_use]
    pub fn create_cookie(name: &str, value: &str, options: CookieOptions) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value.to_owned())
            .http_only(options.http_only)
            .secure(options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish()
    }

    /// Cookie carrying the `.signature` half of an access token
    #[must_use]
    pub fn access_signature_cookie(&self, signature: &str, ttl: u64) -> Cookie<'static> {
        Self::create_cookie(
            &self.access_cookie,
            signature,
            CookieOptions {
                max_age: seconds(ttl),
                ..Default::default()
            },
        )
    }

    /// Cookie carrying the `.signature` half of a refresh token
    #[must_use]
    pub fn refresh_signature_cookie(&self, signature: &str, ttl: u64) -> Cookie<'static> {
        Self::create_cookie(
            &self.refresh_cookie,
            signature,
            CookieOptions {
                path: self.refresh_path.clone(),
                max_age: seconds(ttl),
                ..Default::default()
            },
        )
    }

    /// Expired versions of both signature cookies, clearing them in the browser
    #[must_use]
    pub fn expired_cookies(&self) -> Vec<Cookie<'static>> {
        vec![
            Self::create_cookie(
                &self.access_cookie,
                "",
                CookieOptions {
                    max_age: Duration::seconds(-1),
                    ..Default::default()
                },
            ),
            Self::create_cookie(
                &self.refresh_cookie,
                "",
                CookieOptions {
                    path: self.refresh_path.clone(),
                    max_age: Duration::seconds(-1),
                    ..Default::default()
                },
            ),
        ]
    }
}

fn seconds(ttl: u64) -> Duration {
    Duration::seconds(i64::try_from(ttl).unwrap_or(i64::MAX))
}
