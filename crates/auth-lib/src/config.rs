// ============================
// crates/auth-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with figment: built-in defaults, then
//! `tokenwarden.toml`, then `TOKENWARDEN_`-prefixed environment variables
//! (`__` separates nested keys, e.g. `TOKENWARDEN_RATE_LIMIT__MAX_ATTEMPTS`).
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::auth::rate_limit::ClearPolicy;

/// Config file read by [`Settings::load`]
pub const DEFAULT_CONFIG_FILE: &str = "tokenwarden.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TOKENWARDEN_";

/// Work factor used for passwords and refresh tokens alike
pub const DEFAULT_HASH_COST: u32 = 12;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Reasons a configuration is rejected
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    MissingSecret(&'static str),

    #[error("access and refresh token secrets must differ")]
    SharedSecret,

    #[error("hash cost {0} is outside 4..=31")]
    InvalidHashCost(u32),

    #[error("invalid rate limit settings: {0}")]
    InvalidRateLimit(&'static str),

    #[error("unknown log level: {0}")]
    InvalidLogLevel(String),
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HMAC secret for access tokens
    pub access_token_secret: String,
    /// HMAC secret for refresh tokens, distinct from the access secret
    pub refresh_token_secret: String,
    /// Deployment environment; `production` turns on secure cookies
    pub environment: String,
    /// Explicit override for the refresh cookie's `Secure` attribute
    #[serde(deserialize_with = "bool_like")]
    pub refresh_cookie_secure: Option<bool>,
    /// Optional `Domain` attribute for the refresh cookie
    pub refresh_cookie_domain: Option<String>,
    /// bcrypt cost (or fallback rounds)
    pub hash_cost: u32,
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Where the flat-file user store lives; in-memory when unset
    pub data_dir: Option<PathBuf>,
    /// Login throttling
    pub rate_limit: RateLimitSettings,
}

/// Login throttling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Attempts allowed per key inside one window
    pub max_attempts: u32,
    /// Window length in seconds
    pub window_secs: u64,
    /// Which settled outcomes wipe a key's counter
    pub clear_on: ClearPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            environment: "development".to_string(),
            refresh_cookie_secure: None,
            refresh_cookie_domain: None,
            hash_cost: DEFAULT_HASH_COST,
            log_level: "info".to_string(),
            log_json: false,
            data_dir: None,
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_secs: 15 * 60,
            clear_on: ClearPolicy::Success,
        }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Settings {
    /// Load settings from `tokenwarden.toml` and the environment
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from an explicit config file and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret("access_token_secret"));
        }
        if self.refresh_token_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret("refresh_token_secret"));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }
        if !(4..=31).contains(&self.hash_cost) {
            return Err(ConfigError::InvalidHashCost(self.hash_cost));
        }
        if self.rate_limit.max_attempts == 0 {
            return Err(ConfigError::InvalidRateLimit("max_attempts must be positive"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::InvalidRateLimit("window_secs must be positive"));
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    /// `Secure` cookie attribute: explicit override first, then environment
    pub fn secure_cookies(&self) -> bool {
        self.refresh_cookie_secure
            .unwrap_or_else(|| self.is_production())
    }
}

/// Accepts `true`/`false`, `1`/`0`, or their string forms.
/// Any other string reads as `false`.
fn bool_like<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(Option::<BoolLike>::deserialize(deserializer)?.map(|value| match value {
        BoolLike::Bool(b) => b,
        BoolLike::Int(i) => i == 1,
        BoolLike::Text(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
    }))
}
