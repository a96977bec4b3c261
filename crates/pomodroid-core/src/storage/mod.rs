mod config;

pub use config::{Config, NotificationsConfig, TimerConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the configuration directory, creating it if needed.
///
/// `POMODROID_CONFIG_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/pomodroid[-dev]/`, with the `-dev` suffix when
/// `POMODROID_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMODROID_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMODROID_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomodroid-dev")
            } else {
                base_dir.join("pomodroid")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::NoDataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
