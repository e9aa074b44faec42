//! Settings shared by every subcommand.

use std::path::PathBuf;

use plann_core::timespec::{parse_dt, Want};
use plann_core::{Config, DurationSpec, TimeZonePolicy, Timestamp};

use crate::store::CalendarFile;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub struct Context {
    pub config_path: PathBuf,
    pub config: Config,
    pub tz: TimeZonePolicy,
    calendar_path: Option<PathBuf>,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>, calendar_path: Option<PathBuf>) -> CliResult<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::default_path()?,
        };
        let config = Config::load_from(&config_path)?;
        let tz = config.time_zone_policy()?;
        Ok(Self {
            config_path,
            config,
            tz,
            calendar_path,
        })
    }

    /// `--calendar`, else `calendar_file` from the config, else
    /// `calendar.json` next to the config file.
    pub fn calendar_path(&self) -> PathBuf {
        if let Some(path) = &self.calendar_path {
            return path.clone();
        }
        if let Some(path) = &self.config.calendar_file {
            return path.clone();
        }
        self.config_path
            .parent()
            .map(|dir| dir.join("calendar.json"))
            .unwrap_or_else(|| PathBuf::from("calendar.json"))
    }

    pub fn open_calendar(&self) -> CliResult<CalendarFile> {
        Ok(CalendarFile::open(&self.calendar_path(), self.tz)?)
    }

    /// A point in time from user input, with dates taken as midnight.
    pub fn timestamp(&self, input: &str) -> CliResult<Timestamp> {
        Ok(self.tz.ensure_ts(parse_dt(input, Want::DateTime, &self.tz)?))
    }

    /// `start` moved forward by a duration expression like `60d`.
    pub fn after(&self, start: Timestamp, spec: &str) -> CliResult<Timestamp> {
        let spec = DurationSpec::parse(spec.trim_start_matches('+'))?;
        Ok(self.tz.ensure_ts(spec.apply(start.into(), &self.tz)?))
    }

    pub fn show(&self, ts: Timestamp) -> String {
        self.tz.display(ts).format("%Y-%m-%d %H:%M %:z").to_string()
    }
}
