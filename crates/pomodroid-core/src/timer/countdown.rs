//! Single countdown with wall-clock accounting.
//!
//! The countdown does not own a thread or a timer. The caller polls it with
//! the current instant (the driver does so once per second) and it reports
//! either the remaining time or completion.

use std::time::Duration;
use tokio::time::Instant;

/// Outcome of polling a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Time is left; carries the remaining milliseconds.
    Tick(u64),
    /// Remaining time reached zero.
    Finished,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    total_ms: u64,
    started_at: Instant,
    /// Last remaining value handed out. Never increases.
    remaining_ms: u64,
}

impl Countdown {
    pub fn new(total: Duration, started_at: Instant) -> Self {
        let total_ms = u64::try_from(total.as_millis()).unwrap_or(u64::MAX);
        Self {
            total_ms,
            started_at,
            remaining_ms: total_ms,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.total_ms - self.remaining_ms
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_ms == 0
    }

    /// Recompute remaining time at `now`.
    ///
    /// An instant earlier than a previous poll keeps the previous value.
    pub fn poll(&mut self, now: Instant) -> CountdownStep {
        let elapsed = now.saturating_duration_since(self.started_at);
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let remaining = self.total_ms.saturating_sub(elapsed_ms);
        self.remaining_ms = self.remaining_ms.min(remaining);

        if self.remaining_ms == 0 {
            CountdownStep::Finished
        } else {
            CountdownStep::Tick(self.remaining_ms)
        }
    }
}
