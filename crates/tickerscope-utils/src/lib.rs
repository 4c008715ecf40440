//! Shared utilities for tickerscope
//!
//! This crate provides common functionality used across the tickerscope workspace,
//! including logging setup and environment-backed configuration helpers.

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError, env_duration_secs, env_parse, env_string};
pub use logging::{init_tracing, init_tracing_with};
