//! Human duration expressions such as `3h`, `2.5d` or `1y1w`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Duration, Months, NaiveDate};
use regex::Regex;

use super::{DateOrTime, TimeZonePolicy, Timestamp};
use crate::error::TimeSpecError;

static TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?\d+(?:\.\d+)?)([smhdwy])").expect("duration term pattern is valid")
});

/// Seconds in the year unit when there is no calendar date to anchor to.
const YEAR_WITHOUT_CALENDAR: i64 = 365 * 86_400;

/// Unit letter of a duration term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Year,
}

impl TimeUnit {
    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "s" => Some(Self::Second),
            "m" => Some(Self::Minute),
            "h" => Some(Self::Hour),
            "d" => Some(Self::Day),
            "w" => Some(Self::Week),
            "y" => Some(Self::Year),
            _ => None,
        }
    }

    /// Length in seconds; a year is 365 days here.
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
            Self::Week => 604_800,
            Self::Year => YEAR_WITHOUT_CALENDAR,
        }
    }

    fn is_day_granular(&self) -> bool {
        matches!(self, Self::Day | Self::Week | Self::Year)
    }
}

/// One `<signed-number><unit>` term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationTerm {
    pub value: f64,
    pub unit: TimeUnit,
}

impl DurationTerm {
    /// `None` when the term does not fit in a [`Duration`].
    fn to_duration(self) -> Option<Duration> {
        let secs = (self.value * self.unit.seconds() as f64).round();
        if !secs.is_finite() || secs.abs() >= i64::MAX as f64 {
            return None;
        }
        Duration::try_seconds(secs as i64)
    }

    fn whole_value(&self) -> Option<i64> {
        (self.value.fract() == 0.0).then_some(self.value as i64)
    }
}

/// A parsed duration expression.
///
/// Kept as terms rather than collapsed to a [`Duration`] so that years can
/// be applied as calendar years when there is a date to apply them to.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationSpec {
    raw: String,
    terms: Vec<DurationTerm>,
    total: Duration,
}

impl DurationSpec {
    pub fn parse(spec: &str) -> Result<Self, TimeSpecError> {
        let raw = spec.trim();
        if raw.is_empty() {
            return Err(TimeSpecError::InvalidDuration(spec.to_string()));
        }

        let mut rest = raw;
        let mut terms = Vec::new();
        while !rest.is_empty() {
            let caps = TERM_RE
                .captures(rest)
                .ok_or_else(|| TimeSpecError::InvalidDuration(spec.to_string()))?;
            let value: f64 = caps[1]
                .parse()
                .map_err(|_| TimeSpecError::InvalidDuration(spec.to_string()))?;
            let unit = TimeUnit::from_letter(&caps[2])
                .ok_or_else(|| TimeSpecError::InvalidDuration(spec.to_string()))?;
            terms.push(DurationTerm { value, unit });
            rest = &rest[caps[0].len()..];
        }

        let overflow = || TimeSpecError::Overflow(raw.to_string());
        let mut total = Duration::zero();
        for term in &terms {
            total = total
                .checked_add(&term.to_duration().ok_or_else(overflow)?)
                .ok_or_else(overflow)?;
        }

        Ok(Self {
            raw: raw.to_string(),
            terms,
            total,
        })
    }

    pub fn terms(&self) -> &[DurationTerm] {
        &self.terms
    }

    /// True if every term is days, weeks or whole years.
    pub fn is_day_granular(&self) -> bool {
        self.terms
            .iter()
            .all(|t| t.unit.is_day_granular() && t.whole_value().is_some())
    }

    /// Sum of all terms, counting a year as 365 days.
    ///
    /// Checked when parsing, so expressions too large for a [`Duration`]
    /// never get this far.
    pub fn to_duration(&self) -> Duration {
        self.total
    }

    /// Apply the terms in order to `base`.
    ///
    /// A date stays a date when every term is day-granular; otherwise the
    /// date is promoted to midnight in the implicit offset first. Years are
    /// calendar years and must be whole.
    pub fn apply(&self, base: DateOrTime, tz: &TimeZonePolicy) -> Result<DateOrTime, TimeSpecError> {
        for term in &self.terms {
            if term.unit == TimeUnit::Year && term.whole_value().is_none() {
                return Err(TimeSpecError::FractionalYear(self.raw.clone()));
            }
        }

        match base {
            DateOrTime::Date(date) if self.is_day_granular() => {
                let mut date = date;
                for term in &self.terms {
                    date = match term.unit {
                        TimeUnit::Year => add_years_to_date(date, term.value as i64),
                        _ => term.to_duration().and_then(|d| date.checked_add_signed(d)),
                    }
                    .ok_or_else(|| TimeSpecError::Overflow(self.raw.clone()))?;
                }
                Ok(DateOrTime::Date(date))
            }
            other => {
                let mut ts = tz.ensure_ts(other);
                for term in &self.terms {
                    ts = match term.unit {
                        TimeUnit::Year => add_years_to_ts(ts, term.value as i64),
                        _ => term.to_duration().and_then(|d| ts.checked_add_signed(d)),
                    }
                    .ok_or_else(|| TimeSpecError::Overflow(self.raw.clone()))?;
                }
                Ok(DateOrTime::DateTime(ts))
            }
        }
    }
}

/// Add whole calendar years; Feb 29 lands on Feb 28 in non-leap years.
fn add_years_to_date(date: NaiveDate, years: i64) -> Option<NaiveDate> {
    let months = year_months(years)?;
    if years >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    }
}

fn add_years_to_ts(ts: Timestamp, years: i64) -> Option<Timestamp> {
    let months = year_months(years)?;
    if years >= 0 {
        ts.checked_add_months(months)
    } else {
        ts.checked_sub_months(months)
    }
}

fn year_months(years: i64) -> Option<Months> {
    let months = u32::try_from(years.unsigned_abs().checked_mul(12)?).ok()?;
    Some(Months::new(months))
}

impl FromStr for DurationSpec {
    type Err = TimeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Render a duration as the coarsest whole unit rounding up, e.g. `3d` or `5h`.
pub fn round_up_to_spec(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    if secs >= 86_400 {
        format!("{}d", secs / 86_400 + 1)
    } else {
        format!("{}h", secs / 3_600 + 1)
    }
}
