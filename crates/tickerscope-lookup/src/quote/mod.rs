//! Quotes: raw provider payloads and the unified record built from them

pub mod normalize;

pub use normalize::QuoteNormalizer;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{LookupError, Result};
use crate::session::SessionPhase;
use crate::ticker::Ticker;

/// Source of raw quotes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Provider name recorded on the normalized quote
    fn name(&self) -> &'static str;

    /// Fetch the latest quote; unknown symbols may surface as any error
    async fn fetch_quote(&self, ticker: &Ticker) -> Result<RawQuote>;
}

/// A provider quote before normalization
///
/// Prices are plain floats in the provider's own units. `change_percent`, when
/// present, is in percent (1.5 means 1.5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub symbol: String,
    pub last_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub change_amount: Option<f64>,
    pub change_percent: Option<f64>,
    pub currency: Option<String>,
    /// Provider's own session label; advisory only
    pub market_state: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub source: String,
}

const PRICE_KEYS: &[&str] = &[
    "lastPrice",
    "last_price",
    "regularMarketPrice",
    "currentPrice",
    "price",
    "c",
];
const PREVIOUS_CLOSE_KEYS: &[&str] = &[
    "previousClose",
    "previous_close",
    "regularMarketPreviousClose",
    "chartPreviousClose",
    "prevClose",
    "pc",
];
const CHANGE_KEYS: &[&str] = &["change", "regularMarketChange", "d"];
const CHANGE_PERCENT_KEYS: &[&str] = &[
    "changePercent",
    "change_percent",
    "regularMarketChangePercent",
    "dp",
];
const TIMESTAMP_KEYS: &[&str] = &["regularMarketTime", "timestamp", "time", "t"];

impl RawQuote {
    /// Read a flat JSON quote object, accepting the field spellings used by
    /// the common providers
    ///
    /// Numbers may arrive as JSON numbers or numeric strings. Timestamps are
    /// Unix seconds, Unix milliseconds, or RFC 3339 strings. A zero timestamp
    /// is treated as missing.
    pub fn from_json(symbol: &str, source: &str, value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            LookupError::quote_unavailable(symbol, format!("{source} returned a non-object quote"))
        })?;

        let number = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| obj.get(*k))
                .find_map(json_number)
        };
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            symbol: symbol.to_string(),
            last_price: number(PRICE_KEYS),
            previous_close: number(PREVIOUS_CLOSE_KEYS),
            change_amount: number(CHANGE_KEYS),
            change_percent: number(CHANGE_PERCENT_KEYS),
            currency: text("currency"),
            market_state: text("marketState").or_else(|| text("market_state")),
            timestamp: TIMESTAMP_KEYS
                .iter()
                .filter_map(|k| obj.get(*k))
                .find_map(json_timestamp),
            source: source.to_string(),
        })
    }
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        Value::Object(map) => map.get("raw").and_then(json_number),
        _ => None,
    }
}

fn json_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(s) = value.as_str() {
        return DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }

    let raw = value.as_i64()?;
    if raw <= 0 {
        return None;
    }
    // Seconds stay below 1e11 until the year 5138.
    if raw >= 100_000_000_000 {
        DateTime::from_timestamp_millis(raw)
    } else {
        DateTime::from_timestamp(raw, 0)
    }
}

/// Problems noticed while normalizing that do not invalidate the quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// Provider's change percent disagrees with the recomputed one
    ChangePercentMismatch {
        provided: Decimal,
        computed: Decimal,
    },
    /// No usable previous close; change fields are zero
    MissingPreviousClose,
    /// Provider reported a different session than the local classifier
    MarketStateMismatch {
        provider: String,
        local: SessionPhase,
    },
    /// Provider sent no timestamp; the fetch time was used
    MissingTimestamp,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangePercentMismatch { provided, computed } => write!(
                f,
                "provider change {provided}% differs from computed {computed}%"
            ),
            Self::MissingPreviousClose => f.write_str("previous close unavailable; change not computed"),
            Self::MarketStateMismatch { provider, local } => {
                write!(f, "provider reports {provider}, local session is {local}")
            }
            Self::MissingTimestamp => f.write_str("provider timestamp missing; using fetch time"),
        }
    }
}

/// A normalized quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: Ticker,
    pub last_price: Decimal,
    pub previous_close: Option<Decimal>,
    pub change_amount: Decimal,
    /// Percent change against the previous close (1.5 means 1.5%)
    pub change_percent: Decimal,
    pub currency: String,
    /// Locally classified session; authoritative
    pub phase: SessionPhase,
    /// What the provider claimed the session was, if anything
    pub provider_market_state: Option<String>,
    pub as_of: DateTime<Utc>,
    pub source: String,
    pub stale: bool,
    pub warnings: Vec<DataQualityWarning>,
}

impl Quote {
    /// Last price at display precision, e.g. `"189.98"`
    pub fn display_price(&self) -> String {
        format!("{:.2}", self.last_price.round_dp(2))
    }

    /// Signed change at display precision, e.g. `"+1.23 (+0.65%)"`
    pub fn display_change(&self) -> String {
        let sign = if self.change_amount > Decimal::ZERO { "+" } else { "" };
        format!(
            "{sign}{:.2} ({sign}{:.2}%)",
            self.change_amount.round_dp(2),
            self.change_percent.round_dp(2)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_yahoo_style() {
        let raw = RawQuote::from_json(
            "AAPL",
            "yahoo",
            &json!({
                "regularMarketPrice": 196.89,
                "regularMarketPreviousClose": 196.45,
                "regularMarketChangePercent": 0.224,
                "currency": "USD",
                "marketState": "REGULAR",
                "regularMarketTime": 1_718_044_200,
            }),
        )
        .unwrap();

        assert_eq!(raw.last_price, Some(196.89));
        assert_eq!(raw.previous_close, Some(196.45));
        assert_eq!(raw.change_percent, Some(0.224));
        assert_eq!(raw.market_state.as_deref(), Some("REGULAR"));
        assert_eq!(raw.timestamp.unwrap().timestamp(), 1_718_044_200);
    }

    #[test]
    fn test_from_json_finnhub_style() {
        let raw = RawQuote::from_json(
            "AAPL",
            "finnhub",
            &json!({"c": 196.89, "pc": 196.45, "d": 0.44, "dp": 0.224, "t": 1_718_044_200_000_i64}),
        )
        .unwrap();

        assert_eq!(raw.last_price, Some(196.89));
        assert_eq!(raw.change_amount, Some(0.44));
        assert_eq!(raw.timestamp.unwrap().timestamp(), 1_718_044_200);
        assert_eq!(raw.currency, None);
    }

    #[test]
    fn test_from_json_string_and_nested_numbers() {
        let raw = RawQuote::from_json(
            "MSFT",
            "custom",
            &json!({
                "price": "421.50",
                "previousClose": {"raw": 420.0, "fmt": "420.00"},
                "changePercent": "0.36%",
                "t": 0,
            }),
        )
        .unwrap();

        assert_eq!(raw.last_price, Some(421.5));
        assert_eq!(raw.previous_close, Some(420.0));
        assert_eq!(raw.change_percent, Some(0.36));
        assert_eq!(raw.timestamp, None);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = RawQuote::from_json("AAPL", "yahoo", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, LookupError::QuoteUnavailable { .. }));
    }

    #[test]
    fn test_warning_display() {
        let w = DataQualityWarning::MarketStateMismatch {
            provider: "POST".to_string(),
            local: SessionPhase::Closed,
        };
        assert_eq!(w.to_string(), "provider reports POST, local session is CLOSED");
    }
}
