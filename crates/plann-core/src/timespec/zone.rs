//! Timezone preferences passed explicitly to every parse and format call.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use super::{DateOrTime, Timestamp};
use crate::error::TimeSpecError;

/// A timezone as configured: the machine's local zone, a fixed offset,
/// or an IANA name such as `Europe/Helsinki`.
///
/// Named and local zones follow daylight saving; the offset is looked up
/// for every instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Fixed(FixedOffset),
    Named(Tz),
}

impl Zone {
    /// `local`, `UTC`/`Z`, a `+HH:MM` offset, or an IANA zone name.
    pub fn parse(name: &str) -> Result<Self, TimeSpecError> {
        let trimmed = name.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "local" => return Ok(Self::Local),
            "utc" | "z" | "gmt" => return Ok(Self::Fixed(Utc.fix())),
            _ => {}
        }
        if trimmed.starts_with(['+', '-']) {
            return parse_offset(trimmed).map(Self::Fixed);
        }
        trimmed
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| TimeSpecError::InvalidTimezone(name.to_string()))
    }

    /// Offset in effect at the UTC instant `utc`.
    pub fn offset_at(&self, utc: &NaiveDateTime) -> FixedOffset {
        match self {
            Self::Local => Local.offset_from_utc_datetime(utc).fix(),
            Self::Fixed(offset) => *offset,
            Self::Named(tz) => tz.offset_from_utc_datetime(utc).fix(),
        }
    }

    /// The same instant, shown in this zone.
    pub fn convert(&self, ts: Timestamp) -> Timestamp {
        ts.with_timezone(&self.offset_at(&ts.naive_utc()))
    }

    /// Attach this zone to a wall-clock time.
    ///
    /// A time repeated when clocks go back takes the earlier offset. A
    /// time skipped when clocks go forward is read with the offset from
    /// before the change, so `02:30` in a skipped hour lands on `03:30`.
    pub fn from_local(&self, naive: NaiveDateTime) -> Option<Timestamp> {
        self.resolve(naive).or_else(|| {
            let later = naive.checked_add_signed(Duration::hours(1))?;
            self.resolve(later)
        })
    }

    /// Wall-clock constructor in the style of [`TimeZone::with_ymd_and_hms`].
    pub fn with_ymd_and_hms(
        &self,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        min: u32,
        sec: u32,
    ) -> Option<Timestamp> {
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, min, sec)?;
        self.from_local(naive)
    }

    fn resolve(&self, naive: NaiveDateTime) -> Option<Timestamp> {
        match self {
            Self::Local => Local.from_local_datetime(&naive).earliest().map(|t| t.fixed_offset()),
            Self::Fixed(offset) => offset.from_local_datetime(&naive).earliest(),
            Self::Named(tz) => tz.from_local_datetime(&naive).earliest().map(|t| t.fixed_offset()),
        }
    }
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Self::Fixed(offset)
    }
}

/// Which zones to assume and store timestamps in.
///
/// `implicit` is attached to naive input and used for "now"; `store`
/// is what timestamps are converted to before they are written back to
/// the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZonePolicy {
    pub implicit: Zone,
    pub store: Zone,
    pub show_native_timezone: bool,
}

impl TimeZonePolicy {
    /// Implicit zone from the machine, storage in UTC.
    pub fn local() -> Self {
        Self {
            implicit: Zone::Local,
            store: Zone::Fixed(Utc.fix()),
            show_native_timezone: false,
        }
    }

    /// Same offset for input and storage.
    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            implicit: offset.into(),
            store: offset.into(),
            show_native_timezone: false,
        }
    }

    /// Build from config strings such as `local`, `UTC`, `+02:00` or
    /// `Europe/Helsinki`.
    pub fn from_names(implicit: &str, store: &str) -> Result<Self, TimeSpecError> {
        Ok(Self {
            implicit: Zone::parse(implicit)?,
            store: Zone::parse(store)?,
            show_native_timezone: false,
        })
    }

    pub fn with_native_display(mut self, show: bool) -> Self {
        self.show_native_timezone = show;
        self
    }

    /// Current time in the implicit zone, truncated to whole seconds.
    pub fn now(&self) -> Timestamp {
        let now = Utc::now();
        let whole = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        self.implicit.convert(whole.fixed_offset())
    }

    /// Attach the implicit zone to a naive timestamp.
    pub fn from_naive(&self, naive: NaiveDateTime) -> Timestamp {
        self.implicit
            .from_local(naive)
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive).fixed_offset())
    }

    /// Midnight of `date` in the implicit zone.
    pub fn start_of_day(&self, date: NaiveDate) -> Timestamp {
        self.from_naive(date.and_time(chrono::NaiveTime::MIN))
    }

    /// Normalize a date or timestamp to a timezone-aware timestamp.
    pub fn ensure_ts(&self, value: DateOrTime) -> Timestamp {
        match value {
            DateOrTime::Date(date) => self.start_of_day(date),
            DateOrTime::DateTime(ts) => ts,
        }
    }

    /// Convert a value into the storage zone. Dates are left alone.
    pub fn for_storage(&self, value: DateOrTime) -> DateOrTime {
        match value {
            DateOrTime::Date(date) => DateOrTime::Date(date),
            DateOrTime::DateTime(ts) => DateOrTime::DateTime(self.store.convert(ts)),
        }
    }

    /// Timestamp as it should be shown to the user.
    pub fn display(&self, ts: Timestamp) -> Timestamp {
        if self.show_native_timezone {
            ts
        } else {
            self.implicit.convert(ts)
        }
    }
}

impl Default for TimeZonePolicy {
    fn default() -> Self {
        Self::local()
    }
}

/// Parse a `+HH:MM` / `-HHMM` offset.
pub fn parse_offset(name: &str) -> Result<FixedOffset, TimeSpecError> {
    let trimmed = name.trim();
    let invalid = || TimeSpecError::InvalidTimezone(name.to_string());
    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
