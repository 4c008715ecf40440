//! Exchange trading calendars
//!
//! A calendar answers two questions for a date in exchange-local time: is it
//! a trading day, and if so where do the four session boundaries fall.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};

/// Session boundaries for an ordinary trading day, in exchange-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHours {
    /// Start of pre-market trading
    pub pre_market_open: NaiveTime,
    /// Opening bell
    pub regular_open: NaiveTime,
    /// Closing bell
    pub regular_close: NaiveTime,
    /// End of after-hours trading
    pub after_hours_close: NaiveTime,
    /// Closing bell on early-close days
    pub early_regular_close: NaiveTime,
    /// End of after-hours trading on early-close days
    pub early_after_hours_close: NaiveTime,
}

impl Default for SessionHours {
    fn default() -> Self {
        Self {
            pre_market_open: hms(4, 0),
            regular_open: hms(9, 30),
            regular_close: hms(16, 0),
            after_hours_close: hms(20, 0),
            early_regular_close: hms(13, 0),
            early_after_hours_close: hms(17, 0),
        }
    }
}

impl SessionHours {
    /// Boundaries must be strictly increasing on both normal and early days
    pub fn validate(&self) -> Result<()> {
        let ordered = |a: NaiveTime, b: NaiveTime, c: NaiveTime, d: NaiveTime| a < b && b < c && c < d;

        if !ordered(
            self.pre_market_open,
            self.regular_open,
            self.regular_close,
            self.after_hours_close,
        ) {
            return Err(LookupError::ConfigError(
                "session boundaries must satisfy pre-open < open < close < after-hours close"
                    .to_string(),
            ));
        }

        if !ordered(
            self.pre_market_open,
            self.regular_open,
            self.early_regular_close,
            self.early_after_hours_close,
        ) {
            return Err(LookupError::ConfigError(
                "early-close boundaries must fall after the regular open".to_string(),
            ));
        }

        Ok(())
    }
}

/// Boundaries in effect on one specific trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub pre_market_open: NaiveTime,
    pub regular_open: NaiveTime,
    pub regular_close: NaiveTime,
    pub after_hours_close: NaiveTime,
    pub early_close: bool,
}

impl DaySchedule {
    fn regular(hours: &SessionHours) -> Self {
        Self {
            pre_market_open: hours.pre_market_open,
            regular_open: hours.regular_open,
            regular_close: hours.regular_close,
            after_hours_close: hours.after_hours_close,
            early_close: false,
        }
    }

    fn shortened(hours: &SessionHours) -> Self {
        Self {
            pre_market_open: hours.pre_market_open,
            regular_open: hours.regular_open,
            regular_close: hours.early_regular_close,
            after_hours_close: hours.early_after_hours_close,
            early_close: true,
        }
    }
}

/// Trading calendar for one exchange
pub trait ExchangeCalendar: Send + Sync {
    /// Human readable exchange name
    fn name(&self) -> &str;

    /// The exchange's civil time zone
    fn timezone(&self) -> Tz;

    /// Schedule for `date`, or `None` when the exchange does not trade that day
    ///
    /// Fails with [`LookupError::CalendarUnavailable`] when the calendar has no
    /// data for the date.
    fn schedule(&self, date: NaiveDate) -> Result<Option<DaySchedule>>;

    /// Whether the exchange trades on `date`
    fn is_trading_day(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.schedule(date)?.is_some())
    }
}

/// Rule-based NYSE/Nasdaq calendar
///
/// Holidays follow the exchange's published observance rules: a holiday that
/// falls on Saturday is observed the Friday before, one that falls on Sunday
/// the Monday after, except that a Saturday New Year's Day is not observed.
/// Unscheduled closures (national days of mourning, weather) are not known to
/// the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NyseCalendar {
    hours: SessionHours,
    first_year: i32,
    last_year: i32,
}

impl Default for NyseCalendar {
    fn default() -> Self {
        Self::new(SessionHours::default(), 2000, 2099)
    }
}

impl NyseCalendar {
    pub fn new(hours: SessionHours, first_year: i32, last_year: i32) -> Self {
        Self {
            hours,
            first_year,
            last_year,
        }
    }

    /// Session boundaries used for ordinary days
    pub fn hours(&self) -> &SessionHours {
        &self.hours
    }

    /// Full-day market holidays in `year`, sorted
    pub fn holidays(&self, year: i32) -> Result<Vec<NaiveDate>> {
        let mut days = vec![
            nth_weekday(year, 1, Weekday::Mon, 3)?,
            nth_weekday(year, 2, Weekday::Mon, 3)?,
            easter_sunday(year)? - Duration::days(2),
            last_weekday(year, 5, Weekday::Mon)?,
            observed(ymd(year, 7, 4)?),
            nth_weekday(year, 9, Weekday::Mon, 1)?,
            nth_weekday(year, 11, Weekday::Thu, 4)?,
            observed(ymd(year, 12, 25)?),
        ];

        let new_year = ymd(year, 1, 1)?;
        match new_year.weekday() {
            Weekday::Sat => {}
            Weekday::Sun => days.push(new_year + Duration::days(1)),
            _ => days.push(new_year),
        }

        if year >= 2022 {
            days.push(observed(ymd(year, 6, 19)?));
        }

        days.sort_unstable();
        Ok(days)
    }

    fn is_holiday(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.holidays(date.year())?.contains(&date))
    }

    fn is_open(&self, date: NaiveDate) -> Result<bool> {
        Ok(!is_weekend(date) && !self.is_holiday(date)?)
    }

    fn is_early_close(&self, date: NaiveDate) -> Result<bool> {
        let year = date.year();
        let day_after_thanksgiving = nth_weekday(year, 11, Weekday::Thu, 4)? + Duration::days(1);

        Ok(date == ymd(year, 7, 3)? || date == ymd(year, 12, 24)? || date == day_after_thanksgiving)
    }

    fn check_supported(&self, date: NaiveDate) -> Result<()> {
        if (self.first_year..=self.last_year).contains(&date.year()) {
            Ok(())
        } else {
            Err(LookupError::CalendarUnavailable {
                date,
                reason: format!(
                    "NYSE rules cover {}..={} only",
                    self.first_year, self.last_year
                ),
            })
        }
    }
}

impl ExchangeCalendar for NyseCalendar {
    fn name(&self) -> &str {
        "NYSE"
    }

    fn timezone(&self) -> Tz {
        chrono_tz::America::New_York
    }

    fn schedule(&self, date: NaiveDate) -> Result<Option<DaySchedule>> {
        self.check_supported(date)?;

        if !self.is_open(date)? {
            return Ok(None);
        }

        if self.is_early_close(date)? {
            Ok(Some(DaySchedule::shortened(&self.hours)))
        } else {
            Ok(Some(DaySchedule::regular(&self.hours)))
        }
    }
}

fn hms(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| LookupError::CalendarUnavailable {
        date: NaiveDate::MIN,
        reason: format!("{year}-{month:02}-{day:02} is not a representable date"),
    })
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Result<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n).ok_or_else(|| {
        LookupError::CalendarUnavailable {
            date: NaiveDate::MIN,
            reason: format!("no {weekday} #{n} in {year}-{month:02}"),
        }
    })
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Result<NaiveDate> {
    let first_of_next = if month == 12 {
        ymd(year + 1, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };

    let mut day = first_of_next - Duration::days(1);
    while day.weekday() != weekday {
        day -= Duration::days(1);
    }
    Ok(day)
}

/// Gregorian Easter (anonymous Gregorian algorithm)
fn easter_sunday(year: i32) -> Result<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    ymd(year, month as u32, day as u32)
}
