use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Progress message sent once per second during a countdown and once more
/// when it reaches zero.
///
/// On the wire the state is its numeric code (0-3), not its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub remaining_ms: u64,
    #[serde(with = "state_code")]
    pub state: TimerState,
}

mod state_code {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::timer::TimerState;

    pub fn serialize<S: Serializer>(state: &TimerState, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(state.code())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimerState, D::Error> {
        let code = u8::deserialize(deserializer)?;
        TimerState::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("unknown state code: {code}")))
    }
}

impl Tick {
    pub fn new(remaining_ms: u64, state: TimerState) -> Self {
        Self { remaining_ms, state }
    }

    /// Numeric state as carried on the wire (0-3).
    pub fn state_code(&self) -> u8 {
        self.state.code()
    }

    /// Whole seconds left, rounded up.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }
}

/// Every state change of the timer service produces an Event.
/// Subscribers receive them through the [`EventBus`](crate::bus::EventBus).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        run_id: uuid::Uuid,
        state: TimerState,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    Tick(Tick),
    /// Countdown cancelled before reaching zero.
    TimerStopped {
        state: TimerState,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; `finished` is the state of the run that ended
    /// and `state` the one the service moved to.
    TimerFinished {
        finished: TimerState,
        state: TimerState,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn as_tick(&self) -> Option<&Tick> {
        match self {
            Event::Tick(tick) => Some(tick),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::TimerFinished { .. } | Event::TimerStopped { .. })
    }
}
