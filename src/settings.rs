//! Settings loading
//!
//! Settings are read from `Settings.toml` in the current directory, replaced by
//! `$API_GUARD_SECRETS_DIR/Settings.toml` when present, then overridden by
//! environment variables. The resulting [`Settings`] is turned into the
//! immutable runtime configs of each component.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hmac_verification::{HmacConfig, DEFAULT_MAX_AGE_SECONDS};
use crate::security::{RequestGuards, SecurityHeaders, DEFAULT_CSRF_HEADER};
use crate::session::config::{
    SessionConfig, DEFAULT_ACCESS_TOKEN_SALT, DEFAULT_REFRESH_TOKEN_SALT,
};
use crate::utils::crypto::DigestAlgorithm;

#[cfg(feature = "oauth2")]
use crate::oauth2::{JwtAlgorithm, KeySet, OAuth2Config};

pub const SECRETS_DIR_ENV: &str = "API_GUARD_SECRETS_DIR";
const SETTINGS_FILE: &str = "Settings.toml";

/// Settings failures; `Missing` and `Invalid` name the offending option
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required option `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{option}`: {reason}")]
    Invalid {
        option: &'static str,
        reason: String,
    },
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        source: basic_toml::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub hmac: HmacSettings,
    pub oauth2: OAuth2Settings,
    pub session: SessionSettings,
    pub security: SecuritySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HmacSettings {
    pub secret: Option<String>,
    pub algorithm: DigestAlgorithm,
    pub max_age_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OAuth2Settings {
    /// Base64 encoded JWKS document
    pub keyset: Option<String>,
    pub issuer: Option<String>,
    pub algorithms: Vec<String>,
    pub dummy_verify: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub token_secret: Option<String>,
    pub access_token_ttl_seconds: Option<u64>,
    pub refresh_token_ttl_seconds: Option<u64>,
    pub access_signature_cookie: Option<String>,
    pub refresh_signature_cookie: Option<String>,
    pub refresh_path: Option<String>,
    /// Absolute session lifetime; sessions never expire when unset
    pub session_ttl_seconds: Option<u64>,
    pub access_token_salt: String,
    pub refresh_token_salt: String,
    pub access_token_digest: DigestAlgorithm,
    pub refresh_token_digest: DigestAlgorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub csrf_header: String,
    pub hsts_max_age_seconds: Option<u64>,
    pub allowed_content_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for HmacSettings {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: DigestAlgorithm::Sha256,
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_secret: None,
            access_token_ttl_seconds: None,
            refresh_token_ttl_seconds: None,
            access_signature_cookie: None,
            refresh_signature_cookie: None,
            refresh_path: None,
            session_ttl_seconds: None,
            access_token_salt: DEFAULT_ACCESS_TOKEN_SALT.to_string(),
            refresh_token_salt: DEFAULT_REFRESH_TOKEN_SALT.to_string(),
            access_token_digest: DigestAlgorithm::Sha256,
            refresh_token_digest: DigestAlgorithm::Sha512,
        }
    }
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            hsts_max_age_seconds: None,
            allowed_content_types: vec!["application/json".to_string()],
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables
    ///
    /// Also initializes `env_logger` with the configured level.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or parsed
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.init_logging();
        Ok(settings)
    }

    /// Parse settings from TOML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the text is not valid settings TOML
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        basic_toml::from_str(toml).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (applied separately)
    /// 2. Settings.toml in `API_GUARD_SECRETS_DIR`
    /// 3. Settings.toml in the current directory
    /// 4. Defaults
    fn load_base_settings() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        let default_path = PathBuf::from(SETTINGS_FILE);
        if default_path.exists() {
            settings = Self::read_file(&default_path)?;
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = Path::new(&secrets_dir).join(SETTINGS_FILE);
            if secrets_path.exists() {
                settings = Self::read_file(&secrets_path)?;
            } else {
                debug!(
                    "{SECRETS_DIR_ENV} set but no {SETTINGS_FILE} found at {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let settings = basic_toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display.clone(),
            source,
        })?;
        info!("✓ Loaded settings from {display}");
        Ok(settings)
    }

    fn init_logging(&self) {
        let result = env_logger::Builder::new()
            .parse_filters(&self.logging.level)
            .try_init();
        if result.is_err() {
            debug!("Logger already initialized");
        }
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_hmac_env_overrides(&mut settings.hmac);
        Self::apply_oauth2_env_overrides(&mut settings.oauth2);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_hmac_env_overrides(hmac_settings: &mut HmacSettings) {
        if let Some(secret) = Self::non_empty_env("HMAC_SECRET") {
            hmac_settings.secret = Some(secret);
        }
        if let Some(algorithm) = Self::non_empty_env("HMAC_ALGORITHM") {
            match algorithm.parse() {
                Ok(algorithm) => hmac_settings.algorithm = algorithm,
                Err(e) => warn!("Ignoring HMAC_ALGORITHM: {e}"),
            }
        }
        Self::apply_numeric_env_override("HMAC_MAX_AGE_SECONDS", &mut hmac_settings.max_age_seconds);
    }

    fn apply_oauth2_env_overrides(oauth2_settings: &mut OAuth2Settings) {
        if let Some(keyset) = Self::non_empty_env("OAUTH2_KEYSET") {
            oauth2_settings.keyset = Some(keyset);
        }
        if let Some(issuer) = Self::non_empty_env("OAUTH2_ISSUER") {
            oauth2_settings.issuer = Some(issuer);
        }
        if let Some(algorithms) = Self::non_empty_env("OAUTH2_ALGORITHMS") {
            oauth2_settings.algorithms = algorithms
                .split(',')
                .map(str::trim)
                .filter(|alg| !alg.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(dummy_str) = std::env::var("OAUTH2_DUMMY_VERIFY") {
            if let Ok(dummy) = dummy_str.parse::<bool>() {
                oauth2_settings.dummy_verify = dummy;
            }
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Some(secret) = Self::non_empty_env("SESSION_TOKEN_SECRET") {
            session_settings.token_secret = Some(secret);
        }
        Self::apply_optional_numeric_env_override(
            "SESSION_ACCESS_TTL_SECONDS",
            &mut session_settings.access_token_ttl_seconds,
        );
        Self::apply_optional_numeric_env_override(
            "SESSION_REFRESH_TTL_SECONDS",
            &mut session_settings.refresh_token_ttl_seconds,
        );
        Self::apply_optional_numeric_env_override(
            "SESSION_TTL_SECONDS",
            &mut session_settings.session_ttl_seconds,
        );
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Some(log_level) = Self::non_empty_env("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    fn apply_optional_numeric_env_override(env_var: &str, target: &mut Option<u64>) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = Some(value);
            }
        }
    }

    fn non_empty_env(env_var: &str) -> Option<String> {
        std::env::var(env_var).ok().filter(|value| !value.is_empty())
    }

    // ========================================================================
    // Runtime configs
    // ========================================================================

    /// Validated HMAC verifier configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when `hmac.secret` is unset
    pub fn hmac_config(&self) -> Result<HmacConfig, ConfigError> {
        let secret = required(self.hmac.secret.as_deref(), "hmac.secret")?;
        Ok(HmacConfig::new(secret)
            .with_algorithm(self.hmac.algorithm)
            .with_max_age(self.hmac.max_age_seconds))
    }

    /// Validated OAuth2 verifier configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an unset keyset, issuer or algorithm
    /// list, and `ConfigError::Invalid` when the keyset or an algorithm cannot
    /// be parsed
    #[cfg(feature = "oauth2")]
    pub fn oauth2_config(&self) -> Result<OAuth2Config, ConfigError> {
        let encoded = required(self.oauth2.keyset.as_deref(), "oauth2.keyset")?;
        let issuer = required(self.oauth2.issuer.as_deref(), "oauth2.issuer")?;
        if self.oauth2.algorithms.is_empty() {
            return Err(ConfigError::Missing("oauth2.algorithms"));
        }

        let algorithms = self
            .oauth2
            .algorithms
            .iter()
            .map(|alg| alg.parse::<JwtAlgorithm>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ConfigError::Invalid {
                option: "oauth2.algorithms",
                reason,
            })?;

        let keyset = KeySet::from_base64(encoded).map_err(|e| ConfigError::Invalid {
            option: "oauth2.keyset",
            reason: e.to_string(),
        })?;

        Ok(OAuth2Config::new(keyset, issuer, algorithms).with_dummy_verify(self.oauth2.dummy_verify))
    }

    /// Validated session manager configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for any unset required session option and
    /// `ConfigError::Invalid` for a zero token TTL
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let session = &self.session;
        let token_secret = required(session.token_secret.as_deref(), "session.token_secret")?;
        let access_ttl = positive(
            session.access_token_ttl_seconds,
            "session.access_token_ttl_seconds",
        )?;
        let refresh_ttl = positive(
            session.refresh_token_ttl_seconds,
            "session.refresh_token_ttl_seconds",
        )?;
        let access_cookie = required(
            session.access_signature_cookie.as_deref(),
            "session.access_signature_cookie",
        )?;
        let refresh_cookie = required(
            session.refresh_signature_cookie.as_deref(),
            "session.refresh_signature_cookie",
        )?;
        let refresh_path = required(session.refresh_path.as_deref(), "session.refresh_path")?;

        let mut config = SessionConfig::new(
            token_secret,
            access_ttl,
            refresh_ttl,
            access_cookie,
            refresh_cookie,
            refresh_path,
        )
        .with_session_ttl(session.session_ttl_seconds);
        config.access_token_salt.clone_from(&session.access_token_salt);
        config.refresh_token_salt.clone_from(&session.refresh_token_salt);
        config.access_token_digest = session.access_token_digest;
        config.refresh_token_digest = session.refresh_token_digest;
        Ok(config)
    }

    #[must_use]
    pub const fn security_headers(&self) -> SecurityHeaders {
        SecurityHeaders::new(self.security.hsts_max_age_seconds)
    }

    #[must_use]
    pub fn request_guards(&self) -> RequestGuards {
        RequestGuards::new(
            &self.security.csrf_header,
            self.security.allowed_content_types.clone(),
        )
    }
}

fn required<'a>(value: Option<&'a str>, option: &'static str) -> Result<&'a str, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(option))
}

fn positive(value: Option<u64>, option: &'static str) -> Result<u64, ConfigError> {
    match value {
        None => Err(ConfigError::Missing(option)),
        Some(0) => Err(ConfigError::Invalid {
            option,
            reason: "must be greater than zero".to_string(),
        }),
        Some(v) => Ok(v),
    }
}
