// ============================
// passgate-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered, later sources winning:
//! built-in defaults, a TOML file, `PASSGATE_`-prefixed environment variables
//! (`__` separates nested keys, e.g. `PASSGATE_TOKENS__ACCESS_SECRET`), and
//! finally the legacy `JWT_SECRET` / `JWT_REFRESH_SECRET` variables.
use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::token::{Secret, SigningAlgorithm};
use crate::error::AppError;

/// Config file read by [`Settings::load`]
pub const DEFAULT_CONFIG_FILE: &str = "passgate.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "PASSGATE_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log level, overridden by `RUST_LOG` when set
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Token signing settings
    pub tokens: TokenSettings,
}

/// Token signing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Secret for access tokens
    #[serde(skip_serializing)]
    pub access_secret: Secret,
    /// Secret for refresh tokens
    #[serde(skip_serializing)]
    pub refresh_secret: Secret,
    /// HMAC algorithm used for both domains
    pub algorithm: SigningAlgorithm,
    /// Access token lifetime in seconds
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            tokens: TokenSettings::default(),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_secret: Secret::default(),
            refresh_secret: Secret::default(),
            algorithm: SigningAlgorithm::HS256,
            access_ttl_secs: 60 * 60,               // 1 hour
            refresh_ttl_secs: 60 * 60 * 24 * 7,     // 7 days
        }
    }
}

impl TokenSettings {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

impl Settings {
    /// Build the layered figment, reading `path` as the TOML layer
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&["JWT_SECRET", "JWT_REFRESH_SECRET"])
                    .map(|key| {
                        if key.as_str().eq_ignore_ascii_case("JWT_SECRET") {
                            "tokens.access_secret".into()
                        } else {
                            "tokens.refresh_secret".into()
                        }
                    }),
            )
    }

    /// Load settings from [`DEFAULT_CONFIG_FILE`] and the environment
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from a specific file and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let settings: Settings = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<(), AppError> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "invalid log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        let tokens = &self.tokens;
        if tokens.access_secret.is_empty() {
            return Err(AppError::Config("access token secret is not configured".to_string()));
        }
        if tokens.refresh_secret.is_empty() {
            return Err(AppError::Config("refresh token secret is not configured".to_string()));
        }
        if tokens.access_ttl_secs == 0 || tokens.refresh_ttl_secs == 0 {
            return Err(AppError::Config("token lifetimes must be positive".to_string()));
        }
        if tokens.refresh_ttl_secs < tokens.access_ttl_secs {
            return Err(AppError::Config(
                "refresh token lifetime must not be shorter than access token lifetime".to_string(),
            ));
        }
        if tokens.access_secret.expose() == tokens.refresh_secret.expose() {
            tracing::warn!("access and refresh tokens share a secret; the domains are not separated");
        }

        Ok(())
    }
}
