//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use validator::{Validate, ValidationError};

/// Application configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Chat platform configuration.
    pub platform: PlatformConfig,
    /// Reversal retry configuration.
    #[serde(default)]
    #[validate(nested)]
    pub reversal: ReversalConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://...` or `sqlite://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Chat platform configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform REST API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bot token used to authenticate undo calls.
    pub token: String,
    /// Role identifier applied to muted members.
    pub mute_role: String,
}

/// Backoff settings for failed reversals.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_backoff"))]
pub struct ReversalConfig {
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    #[validate(range(min = 1))]
    pub initial_backoff_ms: u64,
    /// Upper bound for any single retry delay, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Multiplier for exponential backoff.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Failed attempts after which an operator alert is raised.
    #[serde(default = "default_alert_after_attempts")]
    #[validate(range(min = 1))]
    pub alert_after_attempts: u32,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            alert_after_attempts: default_alert_after_attempts(),
        }
    }
}

fn validate_backoff(config: &ReversalConfig) -> Result<(), ValidationError> {
    if config.max_backoff_ms < config.initial_backoff_ms {
        return Err(ValidationError::new("backoff_bounds")
            .with_message("max_backoff_ms must not be below initial_backoff_ms".into()));
    }
    // Also rejects NaN
    if !(config.multiplier.is_finite() && config.multiplier >= 1.0) {
        return Err(ValidationError::new("backoff_multiplier")
            .with_message("multiplier must be a finite number of at least 1.0".into()));
    }
    Ok(())
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    1
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    5 * 60 * 1_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_alert_after_attempts() -> u32 {
    5
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `WARDEN_ENV`)
    /// 3. Environment variables with `WARDEN_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::validated(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::validated(config)
    }

    fn validated(source: config::Config) -> Result<Self, config::ConfigError> {
        let config: Self = source.try_deserialize()?;
        config
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(config)
    }
}
