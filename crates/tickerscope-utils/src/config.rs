//! Configuration management utilities
//!
//! Small helpers for reading typed settings out of the process environment.
//! Every helper returns `Ok(None)` when the variable is unset or blank, so
//! callers can layer environment values over their own defaults.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Error raised when an environment variable is present but unusable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The value could not be parsed into the requested type
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Application-level settings shared by every binary in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "tickerscope".to_string(),
            environment: "development".to_string(),
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Read `TICKERSCOPE_ENV` and `TICKERSCOPE_JSON_LOGS` over the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            app_name: defaults.app_name,
            environment: env_string("TICKERSCOPE_ENV").unwrap_or(defaults.environment),
            json_logs: env_parse("TICKERSCOPE_JSON_LOGS")?.unwrap_or(defaults.json_logs),
        })
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "prod" | "production")
    }
}

/// Read a non-blank string variable
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse a variable
pub fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        None => Ok(None),
        Some(raw) => parse_value(key, &raw).map(Some),
    }
}

/// Read a whole number of seconds as a [`Duration`]
pub fn env_duration_secs(key: &str) -> Result<Option<Duration>, ConfigError> {
    Ok(env_parse::<u64>(key)?.map(Duration::from_secs))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
