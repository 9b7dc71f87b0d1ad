use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_CREDIT_TERM_DAYS: i64 = 30;
const DEFAULT_SUBTOTAL_TOLERANCE: f64 = 0.01;

/// Runtime configuration for the transaction core.
///
/// Values layer from `config/default.toml`, an optional per-environment
/// file, and `APP__*` environment variables, in that order. Pool tuning
/// nests under `pool` (`APP__POOL__MAX_CONNECTIONS` and friends).
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations when the pool opens
    #[serde(default)]
    pub auto_migrate: bool,

    /// Connection pool tuning
    #[serde(default)]
    pub pool: PoolTuning,

    /// Days until a store credit falls due, counted from the day it opens
    #[serde(default = "default_credit_term_days")]
    #[validate(range(min = 1, max = 3650))]
    pub credit_term_days: i64,

    /// Divergence between a caller-supplied subtotal and the computed one
    /// that is tolerated without a warning
    #[serde(default = "default_subtotal_tolerance")]
    #[validate(custom = "validate_subtotal_tolerance")]
    pub subtotal_tolerance: f64,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

/// Database pool knobs, all optional in config files.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolTuning {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            max_connections: 16,
            min_connections: 2,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            acquire_timeout_secs: 8,
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_credit_term_days() -> i64 {
    DEFAULT_CREDIT_TERM_DAYS
}

fn default_subtotal_tolerance() -> f64 {
    DEFAULT_SUBTOTAL_TOLERANCE
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => {
            let mut err = ValidationError::new("log_level");
            err.message = Some("expected one of: trace, debug, info, warn, error".into());
            Err(err)
        }
    }
}

// The derive hands numeric fields to custom validators by value.
fn validate_subtotal_tolerance(tolerance: f64) -> Result<(), ValidationError> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        return Ok(());
    }
    let mut err = ValidationError::new("subtotal_tolerance");
    err.message = Some("subtotal_tolerance must be a finite value >= 0.0".into());
    Err(err)
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity > 0 {
        return Ok(());
    }
    let mut err = ValidationError::new("event_channel_capacity");
    err.message = Some("event_channel_capacity must hold at least one event".into());
    Err(err)
}

/// Initializes tracing using the provided log level as the default filter.
/// An explicit `RUST_LOG` wins over the configured level.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let directive = env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| format!("tienda_core={}", level));

    let builder = fmt().with_env_filter(directive);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Loads application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. Built-in defaults
/// 2. `config/default.toml`, then `config/{env}.toml` (both optional)
/// 3. Environment variables (`APP__*`)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    let config = Config::builder()
        .set_default("database_url", "sqlite://tienda.db?mode=rwc")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    if let Err(e) = app_config.validate() {
        error!("Configuration validation failed: {:?}", e);
        return Err(AppConfigError::Validation(e));
    }

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            environment: "development".into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            pool: PoolTuning::default(),
            credit_term_days: default_credit_term_days(),
            subtotal_tolerance: default_subtotal_tolerance(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = base_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.credit_term_days, 30);
        assert_eq!(config.pool.max_connections, 16);
        assert!((config.subtotal_tolerance - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_credit_term() {
        let mut config = base_config();
        config.credit_term_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_tolerance() {
        let mut config = base_config();
        config.subtotal_tolerance = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_event_channel_capacity() {
        let mut config = base_config();
        config.event_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = base_config();
        config.log_level = "verbose".into();
        assert!(config.validate().is_err());
    }
}
