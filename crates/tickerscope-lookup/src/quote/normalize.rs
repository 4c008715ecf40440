//! Raw quote → [`Quote`]

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use super::{DataQualityWarning, Quote, RawQuote};
use crate::error::{LookupError, Result};
use crate::session::SessionPhase;
use crate::ticker::Ticker;

/// Decimal places kept for prices and change values
pub const INTERNAL_SCALE: u32 = 6;

/// Largest tolerated gap, in percentage points, between a provider's change
/// percent and the recomputed one
pub const CHANGE_PERCENT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

const DEFAULT_CURRENCY: &str = "USD";

/// Turns provider quotes into [`Quote`]s
#[derive(Debug, Clone)]
pub struct QuoteNormalizer {
    freshness: Duration,
    closed_freshness: Duration,
}

impl Default for QuoteNormalizer {
    fn default() -> Self {
        Self::new(
            std::time::Duration::from_secs(15 * 60),
            std::time::Duration::from_secs(4 * 24 * 3600),
        )
    }
}

impl QuoteNormalizer {
    /// `freshness` applies while the market trades in any session;
    /// `closed_freshness` applies when it is closed and the last print is
    /// expected to be old
    pub fn new(freshness: std::time::Duration, closed_freshness: std::time::Duration) -> Self {
        Self {
            freshness: Duration::from_std(freshness).unwrap_or(Duration::MAX),
            closed_freshness: Duration::from_std(closed_freshness).unwrap_or(Duration::MAX),
        }
    }

    /// Build a [`Quote`] from `raw`, attaching the locally computed `phase`
    ///
    /// Fails with [`LookupError::QuoteUnavailable`] when there is no positive,
    /// finite last price.
    pub fn normalize(
        &self,
        raw: RawQuote,
        ticker: &Ticker,
        phase: SessionPhase,
        now: DateTime<Utc>,
    ) -> Result<Quote> {
        let mut warnings = Vec::new();

        let last_price = raw
            .last_price
            .and_then(to_decimal)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| {
                LookupError::quote_unavailable(
                    ticker.as_str(),
                    format!("{} returned no tradable price", raw.source),
                )
            })?;

        let previous_close = raw
            .previous_close
            .and_then(to_decimal)
            .filter(|p| *p > Decimal::ZERO);

        let (change_amount, change_percent) = match previous_close {
            Some(prev) => {
                let change = last_price - prev;
                let percent = change
                    .checked_div(prev)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                    .ok_or_else(|| {
                        LookupError::quote_unavailable(
                            ticker.as_str(),
                            format!("{} returned a change percent out of range", raw.source),
                        )
                    })?
                    .round_dp(INTERNAL_SCALE);

                if let Some(provided) = raw.change_percent.and_then(to_decimal) {
                    let gap = provided.checked_sub(percent).map(|d| d.abs());
                    if gap.is_none_or(|gap| gap > CHANGE_PERCENT_TOLERANCE) {
                        tracing::warn!(
                            symbol = %ticker,
                            source = %raw.source,
                            %provided,
                            computed = %percent,
                            "provider change percent disagrees with recomputed value"
                        );
                        warnings.push(DataQualityWarning::ChangePercentMismatch {
                            provided,
                            computed: percent,
                        });
                    }
                }

                (change.round_dp(INTERNAL_SCALE), percent)
            }
            None => {
                warnings.push(DataQualityWarning::MissingPreviousClose);
                (Decimal::ZERO, Decimal::ZERO)
            }
        };

        if let Some(state) = raw.market_state.as_deref() {
            if let Some(provider_phase) = SessionPhase::from_provider_state(state) {
                if provider_phase != phase {
                    tracing::debug!(
                        symbol = %ticker,
                        provider_state = state,
                        local = %phase,
                        "ignoring provider market state"
                    );
                    warnings.push(DataQualityWarning::MarketStateMismatch {
                        provider: state.to_string(),
                        local: phase,
                    });
                }
            }
        }

        let as_of = match raw.timestamp {
            Some(ts) => ts,
            None => {
                warnings.push(DataQualityWarning::MissingTimestamp);
                now
            }
        };

        let limit = if phase.is_trading() {
            self.freshness
        } else {
            self.closed_freshness
        };
        let stale = now.signed_duration_since(as_of) > limit;

        Ok(Quote {
            ticker: ticker.clone(),
            last_price,
            previous_close,
            change_amount,
            change_percent,
            currency: raw
                .currency
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            phase,
            provider_market_state: raw.market_state,
            as_of,
            source: raw.source,
            stale,
            warnings,
        })
    }
}

fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64_retain(value).map(|d| d.round_dp(INTERNAL_SCALE))
}
