use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pomodoro life cycle states.
///
/// The numeric codes are part of the tick payload and must stay stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Ready = 0,
    Pomodoro = 1,
    Finished = 2,
    Break = 3,
}

impl TimerState {
    pub const ALL: [TimerState; 4] = [
        TimerState::Ready,
        TimerState::Pomodoro,
        TimerState::Finished,
        TimerState::Break,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TimerState::Ready),
            1 => Some(TimerState::Pomodoro),
            2 => Some(TimerState::Finished),
            3 => Some(TimerState::Break),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerState::Ready => "ready",
            TimerState::Pomodoro => "pomodoro",
            TimerState::Finished => "finished",
            TimerState::Break => "break",
        }
    }

    /// Notification title shown while in this state.
    pub fn title(self) -> &'static str {
        match self {
            TimerState::Ready => "Ready for a new pomodoro?",
            TimerState::Pomodoro => "Running a pomodoro...",
            TimerState::Finished => "Congratulations! Pomodoro finished!",
            TimerState::Break => "Having a break :)",
        }
    }

    /// Whether a countdown can run in this state.
    pub fn is_countdown(self) -> bool {
        matches!(self, TimerState::Pomodoro | TimerState::Break)
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if let Ok(code) = lowered.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown state code: {code}"));
        }
        match lowered.as_str() {
            "ready" => Ok(TimerState::Ready),
            "pomodoro" | "running" => Ok(TimerState::Pomodoro),
            "finished" => Ok(TimerState::Finished),
            "break" => Ok(TimerState::Break),
            other => Err(format!("unknown state: {other}")),
        }
    }
}
