use crate::token::TokenCodec;
use crate::utils::crypto::DigestAlgorithm;

pub const DEFAULT_ACCESS_TOKEN_SALT: &str = "access_token";
pub const DEFAULT_REFRESH_TOKEN_SALT: &str = "refresh_token";

/// Immutable runtime configuration of the session manager
#[derive(Clone)]
pub struct SessionConfig {
    pub token_secret: String,
    pub access_token_ttl: u64,
    pub refresh_token_ttl: u64,
    pub access_signature_cookie: String,
    pub refresh_signature_cookie: String,
    /// Path the refresh signature cookie is scoped to
    pub refresh_path: String,
    /// Absolute session lifetime; `None` means sessions live until revoked
    pub session_ttl: Option<u64>,
    pub access_token_salt: String,
    pub refresh_token_salt: String,
    pub access_token_digest: DigestAlgorithm,
    pub refresh_token_digest: DigestAlgorithm,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("token_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("access_signature_cookie", &self.access_signature_cookie)
            .field("refresh_signature_cookie", &self.refresh_signature_cookie)
            .field("refresh_path", &self.refresh_path)
            .field("session_ttl", &self.session_ttl)
            .field("access_token_salt", &self.access_token_salt)
            .field("refresh_token_salt", &self.refresh_token_salt)
            .field("access_token_digest", &self.access_token_digest)
            .field("refresh_token_digest", &self.refresh_token_digest)
            .finish()
    }
}

impl SessionConfig {
    /// Configuration with the default salts and digests
    #[must_use]
    pub fn new(
        token_secret: &str,
        access_token_ttl: u64,
        refresh_token_ttl: u64,
        access_signature_cookie: &str,
        refresh_signature_cookie: &str,
        refresh_path: &str,
    ) -> Self {
        Self {
            token_secret: token_secret.to_string(),
            access_token_ttl,
            refresh_token_ttl,
            access_signature_cookie: access_signature_cookie.to_string(),
            refresh_signature_cookie: refresh_signature_cookie.to_string(),
            refresh_path: refresh_path.to_string(),
            session_ttl: None,
            access_token_salt: DEFAULT_ACCESS_TOKEN_SALT.to_string(),
            refresh_token_salt: DEFAULT_REFRESH_TOKEN_SALT.to_string(),
            access_token_digest: DigestAlgorithm::Sha256,
            refresh_token_digest: DigestAlgorithm::Sha512,
        }
    }

    /// Bound every session to an absolute lifetime
    #[must_use]
    pub const fn with_session_ttl(mut self, session_ttl: Option<u64>) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    /// Codec holding the access and refresh namespaces
    #[must_use]
    pub fn codec(&self) -> TokenCodec {
        TokenCodec::new(
            self.token_secret.as_bytes(),
            &[
                (self.access_token_salt.as_str(), self.access_token_digest),
                (self.refresh_token_salt.as_str(), self.refresh_token_digest),
            ],
        )
    }
}
