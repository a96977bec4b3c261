//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Pomodoro and break lengths
//! - What happens when a start arrives while a countdown runs
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/pomodroid/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{StartPolicy, TimerSettings};

/// Countdown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_pomodoro_minutes")]
    pub pomodoro_minutes: u64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u64,
    #[serde(default)]
    pub start_policy: StartPolicy,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomodroid/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_pomodoro_minutes() -> u64 {
    25
}
fn default_break_minutes() -> u64 {
    5
}
fn default_true() -> bool {
    true
}
fn default_app_name() -> String {
    "Pomodroid".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            pomodoro_minutes: default_pomodoro_minutes(),
            break_minutes: default_break_minutes(),
            start_policy: StartPolicy::default(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: default_app_name(),
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
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot replace a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Location of the config file in the data directory.
    pub fn file_path() -> Result<PathBuf, ConfigError> {
        Self::path()
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// The result must still describe valid timer settings; otherwise the
    /// config is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.timer_settings()?;
        *self = updated;
        Ok(())
    }

    /// Validated settings for the timer service.
    pub fn timer_settings(&self) -> Result<TimerSettings, ConfigError> {
        for (key, minutes) in [
            ("timer.pomodoro_minutes", self.timer.pomodoro_minutes),
            ("timer.break_minutes", self.timer.break_minutes),
        ] {
            if minutes == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1 minute".into(),
                });
            }
        }
        Ok(TimerSettings {
            pomodoro_minutes: self.timer.pomodoro_minutes,
            break_minutes: self.timer.break_minutes,
            start_policy: self.timer.start_policy,
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
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.timer.pomodoro_minutes, 25);
        assert_eq!(cfg.timer.break_minutes, 5);
        assert_eq!(cfg.timer.start_policy, StartPolicy::Replace);
        assert!(cfg.notifications.enabled);
        assert_eq!(cfg.notifications.app_name, "Pomodroid");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[timer]\nbreak_minutes = 10\n").unwrap();
        assert_eq!(cfg.timer.break_minutes, 10);
        assert_eq!(cfg.timer.pomodoro_minutes, 25);
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.pomodoro_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("timer.start_policy").as_deref(), Some("replace"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("timer.break_minutes", "10").unwrap();
        cfg.set("notifications.enabled", "false").unwrap();
        cfg.set("timer.start_policy", "reject").unwrap();
        assert_eq!(cfg.timer.break_minutes, 10);
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.timer.start_policy, StartPolicy::Reject);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("notifications.enabled", "not_a_bool").is_err());
        assert!(cfg.set("timer.pomodoro_minutes", "-3").is_err());
        assert!(cfg.set("timer.start_policy", "sometimes").is_err());
        assert!(cfg.set("timer", "{}").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_zero_length() {
        let mut cfg = Config::default();
        let err = cfg.set("timer.pomodoro_minutes", "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "timer.pomodoro_minutes"));
        assert_eq!(cfg.timer.pomodoro_minutes, 25);
    }

    #[test]
    fn timer_settings_follow_config() {
        let mut cfg = Config::default();
        cfg.timer.pomodoro_minutes = 50;
        cfg.timer.break_minutes = 10;
        let settings = cfg.timer_settings().unwrap();
        assert_eq!(settings.pomodoro_minutes, 50);
        assert_eq!(settings.break_minutes, 10);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("timer.pomodoro_minutes", "45").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().timer.pomodoro_minutes, 45);
    }

    #[test]
    fn load_from_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
