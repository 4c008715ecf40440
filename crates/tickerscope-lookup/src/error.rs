//! Error types for lookup operations

use thiserror::Error;

/// Lookup specific errors
#[derive(Debug, Error)]
pub enum LookupError {
    /// Ticker does not match the exchange symbol grammar
    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),

    /// Exchange calendar cannot answer for the requested date
    #[error("Exchange calendar unavailable for {date}: {reason}")]
    CalendarUnavailable {
        date: chrono::NaiveDate,
        reason: String,
    },

    /// Provider returned no tradable price or a malformed response
    #[error("Quote unavailable for {symbol}: {reason}")]
    QuoteUnavailable {
        symbol: String,
        reason: String,
    },

    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Upstream call exceeded its time budget
    #[error("{operation} timed out after {millis} ms")]
    Timeout {
        operation: String,
        millis: u128,
    },

    /// Translation backend rejected or failed a request
    #[error("Translation error: {0}")]
    TranslationError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LookupError {
    /// Shorthand for [`LookupError::QuoteUnavailable`]
    pub fn quote_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QuoteUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Build a timeout error for the named operation
    pub fn timeout(operation: impl Into<String>, after: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            millis: after.as_millis(),
        }
    }
}

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, LookupError>;

impl From<tickerscope_utils::ConfigError> for LookupError {
    fn from(err: tickerscope_utils::ConfigError) -> Self {
        LookupError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = LookupError::InvalidTicker("12$".to_string());
        assert_eq!(err.to_string(), "Invalid ticker: \"12$\"");

        let err = LookupError::quote_unavailable("ZZZZ", "no price");
        assert_eq!(err.to_string(), "Quote unavailable for ZZZZ: no price");

        let err = LookupError::timeout("quote fetch", Duration::from_millis(1500));
        assert_eq!(err.to_string(), "quote fetch timed out after 1500 ms");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: LookupError = tickerscope_utils::ConfigError::InvalidValue {
            key: "TICKERSCOPE_WINDOW_DAYS".to_string(),
            value: "x".to_string(),
            reason: "invalid digit".to_string(),
        }
        .into();

        assert!(matches!(err, LookupError::ConfigError(msg) if msg.contains("WINDOW_DAYS")));
    }
}
