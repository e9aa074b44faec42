//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The daily work-hour budget and planning windows
//! - Which timezone naive input is in, and which one to store in
//! - Postponement defaults
//! - Where the local calendar snapshot lives
//!
//! Configuration is stored at `~/.config/plann/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::postpone::CheckDependent;
use crate::scheduler::validate_hours_per_day;
use crate::timespec::{DurationSpec, TimeZonePolicy};

/// Panic planning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Hours per day that can be spent on tasks
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
    /// How far ahead `panic dismiss` looks for tasks
    #[serde(default = "default_lookahead")]
    pub lookahead: String,
    /// Default end of the timeline, counted from its start
    #[serde(default = "default_horizon")]
    pub horizon: String,
}

/// Timezone configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimezoneConfig {
    /// Offset assumed for naive input: `local`, `UTC` or `+HH:MM`
    #[serde(default = "default_implicit_tz")]
    pub implicit: String,
    /// Offset timestamps are converted to before saving
    #[serde(default = "default_store_tz")]
    pub store: String,
    /// Show timestamps in their own offset instead of the implicit one
    #[serde(default)]
    pub show_native: bool,
}

/// Postponement defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostponeConfig {
    #[serde(default)]
    pub check_dependent: CheckDependent,
    #[serde(default = "default_delay")]
    pub default_delay: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/plann/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON calendar snapshot used when `--calendar` is not given.
    #[serde(default)]
    pub calendar_file: Option<PathBuf>,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub timezone: TimezoneConfig,
    #[serde(default)]
    pub postpone: PostponeConfig,
}

// Default functions
fn default_hours_per_day() -> f64 {
    4.0
}
fn default_lookahead() -> String {
    "60d".into()
}
fn default_horizon() -> String {
    "1y".into()
}
fn default_implicit_tz() -> String {
    "local".into()
}
fn default_store_tz() -> String {
    "UTC".into()
}
fn default_delay() -> String {
    "1d".into()
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            hours_per_day: default_hours_per_day(),
            lookahead: default_lookahead(),
            horizon: default_horizon(),
        }
    }
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            implicit: default_implicit_tz(),
            store: default_store_tz(),
            show_native: false,
        }
    }
}

impl Default for PostponeConfig {
    fn default() -> Self {
        Self {
            check_dependent: CheckDependent::default(),
            default_delay: default_delay(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("'{value}' is not true or false")))?,
                ),
                serde_json::Value::Number(_) => value
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Null if value.is_empty() || value == "none" => {
                    serde_json::Value::Null
                }
                _ if value == "none" => serde_json::Value::Null,
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `<data dir>/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `path`, or return the default when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or holds invalid values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                })
            }
        };
        let cfg: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to `path`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. `none` clears an optional value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the new value does not
    /// validate; the config is left unchanged then.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every leaf key with its current value, in dot-path form.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Check every value that has a constrained format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_hours_per_day(self.planning.hours_per_day)?;
        for (key, spec) in [
            ("planning.lookahead", &self.planning.lookahead),
            ("planning.horizon", &self.planning.horizon),
            ("postpone.default_delay", &self.postpone.default_delay),
        ] {
            DurationSpec::parse(spec).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        }
        self.time_zone_policy()?;
        Ok(())
    }

    /// The timezone policy described by the `timezone` section.
    pub fn time_zone_policy(&self) -> Result<TimeZonePolicy, ConfigError> {
        TimeZonePolicy::from_names(&self.timezone.implicit, &self.timezone.store)
            .map(|tz| tz.with_native_display(self.timezone.show_native))
            .map_err(|e| ConfigError::InvalidValue {
                key: "timezone".to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.planning.hours_per_day, 4.0);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str("[planning]\nhours_per_day = 6.5\n").unwrap();
        assert_eq!(parsed.planning.hours_per_day, 6.5);
        assert_eq!(parsed.planning.lookahead, "60d");
        assert_eq!(parsed.postpone.check_dependent, CheckDependent::Error);
        assert!(parsed.calendar_file.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("planning.hours_per_day").as_deref(), Some("4.0"));
        assert_eq!(cfg.get("timezone.store").as_deref(), Some("UTC"));
        assert_eq!(cfg.get("postpone.check_dependent").as_deref(), Some("error"));
        assert!(cfg.get("planning.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("planning.hours_per_day", "8").unwrap();
        cfg.set("timezone.show_native", "true").unwrap();
        cfg.set("postpone.check_dependent", "interactive").unwrap();
        cfg.set("calendar_file", "/tmp/cal.json").unwrap();
        assert_eq!(cfg.planning.hours_per_day, 8.0);
        assert!(cfg.timezone.show_native);
        assert_eq!(cfg.postpone.check_dependent, CheckDependent::Interactive);
        assert_eq!(cfg.calendar_file, Some(PathBuf::from("/tmp/cal.json")));

        cfg.set("calendar_file", "none").unwrap();
        assert!(cfg.calendar_file.is_none());
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("planning.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("planning.hours_per_day", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("planning.hours_per_day", "25").is_err());
        assert!(cfg.set("timezone.show_native", "maybe").is_err());
        assert!(cfg.set("postpone.check_dependent", "sometimes").is_err());
        assert!(cfg.set("planning.lookahead", "soon").is_err());
        assert!(cfg.set("timezone.implicit", "Mars/Olympus").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn named_timezones_are_accepted() {
        let mut cfg = Config::default();
        cfg.set("timezone.implicit", "Europe/Helsinki").unwrap();
        cfg.set("timezone.store", "+02:00").unwrap();
        let tz = cfg.time_zone_policy().unwrap();
        assert_eq!(tz.implicit, crate::timespec::Zone::Named(chrono_tz::Europe::Helsinki));
    }

    #[test]
    fn entries_list_every_leaf() {
        let keys: Vec<String> = Config::default()
            .entries()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert!(keys.contains(&"planning.horizon".to_string()));
        assert!(keys.contains(&"timezone.implicit".to_string()));
        assert!(keys.contains(&"calendar_file".to_string()));
    }

    #[test]
    fn load_and_save_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let mut cfg = Config::default();
        cfg.set("planning.hours_per_day", "6").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().planning.hours_per_day, 6.0);

        std::fs::write(&path, "[planning]\nhours_per_day = 30.0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
