//! Trading session classification
//!
//! The phase is a pure function of an instant and an exchange calendar. It is
//! computed locally on every request and never taken from a data provider.

pub mod calendar;

pub use calendar::{DaySchedule, ExchangeCalendar, NyseCalendar, SessionHours};

use chrono::{DateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Exchange-relative trading state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    PreMarket,
    Regular,
    AfterHours,
    Closed,
}

impl SessionPhase {
    /// Whether any trading (regular or extended) is happening
    pub fn is_trading(self) -> bool {
        !matches!(self, SessionPhase::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::PreMarket => "PRE_MARKET",
            SessionPhase::Regular => "REGULAR",
            SessionPhase::AfterHours => "AFTER_HOURS",
            SessionPhase::Closed => "CLOSED",
        }
    }

    /// Map a provider's market-state label onto a phase, if recognizable
    ///
    /// Accepts Yahoo-style labels (`PRE`, `PREPRE`, `REGULAR`, `POST`,
    /// `POSTPOST`, `CLOSED`) as well as this crate's own names.
    pub fn from_provider_state(state: &str) -> Option<Self> {
        match state.trim().to_ascii_uppercase().as_str() {
            "PRE" | "PRE_MARKET" | "PREMARKET" => Some(SessionPhase::PreMarket),
            "REGULAR" | "OPEN" => Some(SessionPhase::Regular),
            "POST" | "AFTER_HOURS" | "AFTERHOURS" => Some(SessionPhase::AfterHours),
            "CLOSED" | "PREPRE" | "POSTPOST" => Some(SessionPhase::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DaySchedule {
    /// Phase at exchange-local `time`; lower bounds inclusive, upper exclusive
    pub fn phase_at(&self, time: NaiveTime) -> SessionPhase {
        if time < self.pre_market_open || time >= self.after_hours_close {
            SessionPhase::Closed
        } else if time < self.regular_open {
            SessionPhase::PreMarket
        } else if time < self.regular_close {
            SessionPhase::Regular
        } else {
            SessionPhase::AfterHours
        }
    }
}

/// Determine the trading phase at `now`
///
/// `now` may carry any time zone; it is converted to the exchange's civil time
/// before the date and time-of-day are read, so DST shifts are handled by the
/// zone database rather than a fixed offset.
pub fn classify<Z, C>(now: &DateTime<Z>, calendar: &C) -> Result<SessionPhase>
where
    Z: TimeZone,
    C: ExchangeCalendar + ?Sized,
{
    let local = now.with_timezone(&calendar.timezone());

    let phase = match calendar.schedule(local.date_naive())? {
        None => SessionPhase::Closed,
        Some(schedule) => schedule.phase_at(local.time()),
    };

    tracing::debug!(
        exchange = calendar.name(),
        local_time = %local.format("%Y-%m-%d %H:%M:%S %Z"),
        phase = %phase,
        "classified session"
    );

    Ok(phase)
}
