//! Time arithmetic: timestamps, durations and intervals.
//!
//! Everything that reaches the timeline is a timezone-aware
//! [`Timestamp`]. Naive input is lifted through a [`TimeZonePolicy`],
//! which is passed explicitly instead of living in a global.

mod duration;
mod zone;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use duration::{round_up_to_spec, DurationSpec, DurationTerm, TimeUnit};
pub use zone::{parse_offset, TimeZonePolicy, Zone};

use crate::error::TimeSpecError;

/// A timezone-aware point in time.
pub type Timestamp = DateTime<FixedOffset>;

const DATE_FORMAT: &str = "%Y-%m-%d";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M%:z",
];

static START_PLUS_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\+((?:\d+(?:\.\d+)?[smhdwy])+)$").expect("interval pattern is valid")
});

/// A calendar date (all-day value) or a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateOrTime {
    Date(NaiveDate),
    DateTime(Timestamp),
}

impl DateOrTime {
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// The calendar date, as seen in the value's own offset.
    pub fn date_naive(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(ts) => ts.date_naive(),
        }
    }
}

impl From<NaiveDate> for DateOrTime {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<Timestamp> for DateOrTime {
    fn from(ts: Timestamp) -> Self {
        Self::DateTime(ts)
    }
}

impl fmt::Display for DateOrTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Self::DateTime(ts) => f.write_str(&ts.to_rfc3339()),
        }
    }
}

/// Strict parser for stored values: `YYYY-MM-DD` or RFC 3339.
impl FromStr for DateOrTime {
    type Err = TimeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Ok(Self::Date(date));
        }
        DateTime::parse_from_rfc3339(s)
            .map(Self::DateTime)
            .map_err(|_| TimeSpecError::InvalidTimestamp(s.to_string()))
    }
}

impl Serialize for DateOrTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateOrTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// What kind of value the caller wants back from [`parse_dt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Want {
    /// A date for bare date input, a timestamp otherwise
    #[default]
    Auto,
    Date,
    DateTime,
}

/// Liberal timestamp parser.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` (also with `T`), RFC 3339
/// and a few other offset spellings, and `+<duration>` relative to now.
pub fn parse_dt(input: &str, want: Want, tz: &TimeZonePolicy) -> Result<DateOrTime, TimeSpecError> {
    let input = input.trim();
    let parsed = parse_dt_auto(input, tz)?;
    Ok(match (want, parsed) {
        (Want::Auto, value) => value,
        (Want::Date, DateOrTime::DateTime(ts)) => DateOrTime::Date(ts.date_naive()),
        (Want::Date, date) => date,
        (Want::DateTime, value) => DateOrTime::DateTime(tz.ensure_ts(value)),
    })
}

fn parse_dt_auto(input: &str, tz: &TimeZonePolicy) -> Result<DateOrTime, TimeSpecError> {
    if let Some(relative) = input.strip_prefix('+') {
        let spec = DurationSpec::parse(relative)?;
        return spec.apply(DateOrTime::DateTime(tz.now()), tz);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(DateOrTime::DateTime(ts));
    }
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(input, format) {
            return Ok(DateOrTime::DateTime(ts));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(DateOrTime::DateTime(tz.from_naive(naive)));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_FORMAT) {
        return Ok(DateOrTime::Date(date));
    }

    Err(TimeSpecError::InvalidTimestamp(input.to_string()))
}

/// Parse an interval.
///
/// Accepted forms: `start+duration`, a single timestamp or date (no end),
/// two space-separated dates, and two timestamps whose date and time
/// parts may themselves be space-separated.
pub fn parse_timespec(
    timespec: &str,
    tz: &TimeZonePolicy,
) -> Result<(DateOrTime, Option<DateOrTime>), TimeSpecError> {
    let timespec = timespec.trim();

    if let Some(caps) = START_PLUS_DURATION.captures(timespec) {
        if let Ok(start) = parse_dt(&caps[1], Want::Auto, tz) {
            let end = DurationSpec::parse(&caps[2])?.apply(start, tz)?;
            return Ok((start, Some(end)));
        }
    }

    // A single value never has more than three dashes (date plus a
    // negative offset); anything else is tried as a pair.
    if timespec.matches('-').count() <= 3 {
        if let Ok(single) = parse_dt(timespec, Want::Auto, tz) {
            return Ok((single, None));
        }
    }

    let parts: Vec<&str> = timespec.split_whitespace().collect();
    let invalid = || TimeSpecError::InvalidInterval(timespec.to_string());
    match parts.as_slice() {
        [start, end] => Ok((
            parse_dt(start, Want::Auto, tz).map_err(|_| invalid())?,
            Some(parse_dt(end, Want::Auto, tz).map_err(|_| invalid())?),
        )),
        [start_date, start_time, end_date, end_time] => Ok((
            parse_dt(&format!("{start_date} {start_time}"), Want::Auto, tz).map_err(|_| invalid())?,
            Some(parse_dt(&format!("{end_date} {end_time}"), Want::Auto, tz).map_err(|_| invalid())?),
        )),
        _ => Err(invalid()),
    }
}

/// How [`parse_add_dur`] treats input that is not a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationMode {
    #[default]
    Strict,
    /// Fall back to parsing the whole string as an absolute timestamp
    AllowTimestamp,
}

/// Result of [`parse_add_dur`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddedDuration {
    /// No base was given; the bare length of the expression
    Span(Duration),
    /// The base moved by the expression, or an absolute fallback
    At(DateOrTime),
}

/// Add a duration expression to `base`, or return the span when there is
/// no base.
pub fn parse_add_dur(
    base: Option<DateOrTime>,
    spec: &str,
    mode: DurationMode,
    tz: &TimeZonePolicy,
) -> Result<AddedDuration, TimeSpecError> {
    let parsed = match DurationSpec::parse(spec) {
        Ok(parsed) => parsed,
        Err(err) => {
            return match mode {
                DurationMode::AllowTimestamp => parse_dt(spec, Want::Auto, tz).map(AddedDuration::At),
                DurationMode::Strict => Err(err),
            };
        }
    };

    match base {
        Some(base) => parsed.apply(base, tz).map(AddedDuration::At),
        None => Ok(AddedDuration::Span(parsed.to_duration())),
    }
}
