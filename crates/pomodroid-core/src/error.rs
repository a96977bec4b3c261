//! Core error types for pomodroid-core.
//!
//! One thiserror enum per concern: the countdown service, configuration and
//! the notification backend.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerState;

/// Errors raised by the countdown service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// A countdown is active and the start policy forbids replacing it.
    #[error("a {state} countdown is already running ({remaining_ms} ms left)")]
    AlreadyRunning { state: TimerState, remaining_ms: u64 },

    /// Only pomodoro and break runs have a countdown.
    #[error("cannot start a countdown in state '{0}'")]
    InvalidStartState(TimerState),

    /// The service task is gone (shut down or panicked).
    #[error("timer service is not running")]
    ServiceGone,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dotted key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Config directory could not be resolved or created
    #[error("Configuration directory unavailable: {0}")]
    NoDataDir(String),
}

/// Notification backend errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The platform notification server rejected or failed the request.
    #[error("notification backend failed: {0}")]
    Backend(String),
}
