//! Local calendar snapshot: a JSON array of calendar objects.

use std::path::{Path, PathBuf};

use plann_core::calendar::{CalendarObject, InMemoryCalendar};
use plann_core::error::StoreError;
use plann_core::TimeZonePolicy;
use tracing::debug;

/// An in-memory calendar loaded from, and written back to, one file.
pub struct CalendarFile {
    path: PathBuf,
    pub calendar: InMemoryCalendar,
}

impl CalendarFile {
    /// Load the snapshot; a missing file is an empty calendar.
    pub fn open(path: &Path, tz: TimeZonePolicy) -> Result<Self, StoreError> {
        let objects: Vec<CalendarObject> = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no calendar snapshot yet");
                Vec::new()
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        debug!(path = %path.display(), objects = objects.len(), "calendar loaded");
        Ok(Self {
            path: path.to_path_buf(),
            calendar: InMemoryCalendar::with_objects(objects, tz),
        })
    }

    /// Write the snapshot back if anything was saved since loading.
    pub fn persist(&self) -> Result<bool, StoreError> {
        if self.calendar.saved().is_empty() {
            return Ok(false);
        }
        let content = serde_json::to_string_pretty(self.calendar.objects())?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        std::fs::write(&self.path, content).map_err(io_err)?;
        debug!(path = %self.path.display(), "calendar written");
        Ok(true)
    }
}
