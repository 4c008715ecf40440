//! Equity ticker symbols

use crate::error::{LookupError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Root of 1-5 letters with an optional share-class suffix (`BRK.B`, `BF-B`)
static SYMBOL_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,5}(?:[.\-][A-Z]{1,2})?$").expect("symbol grammar is a valid regex")
});

/// A validated, upper-cased US equity symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Normalize and validate user input
    ///
    /// # Examples
    ///
    /// ```
    /// use tickerscope_lookup::Ticker;
    ///
    /// let t = Ticker::parse("  brk.b ").unwrap();
    /// assert_eq!(t.as_str(), "BRK.B");
    /// assert!(Ticker::parse("").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let normalized = input.trim().to_ascii_uppercase();
        if SYMBOL_GRAMMAR.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(LookupError::InvalidTicker(input.to_string()))
        }
    }

    /// The normalized symbol
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Symbol spelled the way Yahoo Finance expects (`BRK-B` for class shares)
    pub fn yahoo_symbol(&self) -> String {
        self.0.replace('.', "-")
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = LookupError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        assert_eq!(Ticker::parse("aapl").unwrap().as_str(), "AAPL");
        assert_eq!(Ticker::parse(" Nvda\n").unwrap().as_str(), "NVDA");
        assert_eq!(Ticker::parse("bf-b").unwrap().as_str(), "BF-B");
    }

    #[test]
    fn test_parse_rejects_bad_symbols() {
        for bad in ["", "   ", "TOOLONG", "AB1", "A.BCD", "$AAPL", "AA PL", ".A", "A."] {
            assert!(
                matches!(Ticker::parse(bad), Err(LookupError::InvalidTicker(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_yahoo_symbol() {
        assert_eq!(Ticker::parse("BRK.B").unwrap().yahoo_symbol(), "BRK-B");
        assert_eq!(Ticker::parse("AAPL").unwrap().yahoo_symbol(), "AAPL");
    }

    #[test]
    fn test_serde_validates() {
        let t: Ticker = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(t.as_str(), "MSFT");
        assert!(serde_json::from_str::<Ticker>("\"12345\"").is_err());
    }
}
