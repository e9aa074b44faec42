mod config;

pub use config::{Config, PlanningConfig, PostponeConfig, TimezoneConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/plann[-dev]/` based on PLANN_ENV.
///
/// Set PLANN_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PLANN_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("plann-dev")
    } else {
        base_dir.join("plann")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
