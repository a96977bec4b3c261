//! Timer service.
//!
//! Owns the single countdown, the current [`TimerState`] and the derived
//! notification state. Like the rest of the timer module it has no thread of
//! its own: the driver calls [`TimerService::poll`] once per second.
//!
//! ## State Transitions
//!
//! ```text
//! Ready|Finished --start(Pomodoro)--> Pomodoro --zero--> Finished
//! Ready|Finished --start(Break)-----> Break ----zero--> Ready
//! Pomodoro|Break --stop-------------> Ready
//! ```
//!
//! A finished pomodoro does not start a break on its own.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use super::countdown::{Countdown, CountdownStep};
use super::state::TimerState;
use crate::bus::{EventBus, Subscription};
use crate::error::TimerError;
use crate::events::{Event, Tick};
use crate::notify::{Notification, NotificationId, Notifier};

/// What `start` does when a countdown is already active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartPolicy {
    /// Cancel the active countdown and start the new one.
    #[default]
    Replace,
    /// Refuse with [`TimerError::AlreadyRunning`].
    Reject,
}

/// Run lengths and start policy, already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub pomodoro_minutes: u64,
    pub break_minutes: u64,
    pub start_policy: StartPolicy,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            pomodoro_minutes: 25,
            break_minutes: 5,
            start_policy: StartPolicy::Replace,
        }
    }
}

impl TimerSettings {
    /// Configured length in minutes of a run in `state`.
    pub fn minutes_for(&self, state: TimerState) -> u64 {
        match state {
            TimerState::Break => self.break_minutes,
            _ => self.pomodoro_minutes,
        }
    }

    pub fn duration_for(&self, state: TimerState) -> Duration {
        Duration::from_secs(self.minutes_for(state).saturating_mul(60))
    }
}

pub struct TimerService {
    settings: TimerSettings,
    state: TimerState,
    remaining_ms: u64,
    countdown: Option<Countdown>,
    bus: EventBus,
    notifier: Box<dyn Notifier>,
}

impl TimerService {
    pub fn new(settings: TimerSettings, notifier: Box<dyn Notifier>) -> Self {
        Self::with_bus(settings, notifier, EventBus::new())
    }

    pub fn with_bus(settings: TimerSettings, notifier: Box<dyn Notifier>, bus: EventBus) -> Self {
        tracing::debug!(?settings, "timer service created");
        Self {
            settings,
            state: TimerState::Ready,
            remaining_ms: 0,
            countdown: None,
            bus,
            notifier,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn is_running(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Current remaining time and state, without publishing anything.
    pub fn snapshot(&self) -> Tick {
        Tick::new(self.remaining_ms, self.state)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a countdown for `state` using its configured length.
    pub fn start(&mut self, state: TimerState, now: Instant) -> Result<Event, TimerError> {
        if !state.is_countdown() {
            return Err(TimerError::InvalidStartState(state));
        }

        if self.countdown.is_some() {
            match self.settings.start_policy {
                StartPolicy::Reject => {
                    return Err(TimerError::AlreadyRunning {
                        state: self.state,
                        remaining_ms: self.remaining_ms,
                    });
                }
                StartPolicy::Replace => {
                    tracing::info!(
                        previous = %self.state,
                        remaining_ms = self.remaining_ms,
                        "replacing active countdown"
                    );
                    self.stop();
                }
            }
        }

        let countdown = Countdown::new(self.settings.duration_for(state), now);
        self.state = state;
        self.remaining_ms = countdown.remaining_ms();
        let duration_ms = countdown.total_ms();
        self.countdown = Some(countdown);

        self.start_notification();
        tracing::info!(%state, duration_ms, "countdown started");

        let event = Event::TimerStarted {
            run_id: uuid::Uuid::new_v4(),
            state,
            duration_ms,
            at: Utc::now(),
        };
        self.bus.publish(&event);
        Ok(event)
    }

    /// Cancel the active countdown. Does nothing when none is running.
    pub fn stop(&mut self) -> Option<Event> {
        self.countdown.take()?;

        let stopped = self.state;
        self.cancel_notification(NotificationId::Ongoing);
        self.state = TimerState::Ready;
        tracing::info!(state = %stopped, remaining_ms = self.remaining_ms, "countdown stopped");

        let event = Event::TimerStopped {
            state: stopped,
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        };
        self.remaining_ms = 0;
        self.bus.publish(&event);
        Some(event)
    }

    /// Lifecycle teardown: stop whatever runs.
    pub fn shutdown(&mut self) {
        self.stop();
        tracing::debug!("timer service shut down");
    }

    /// Advance the countdown to `now`.
    ///
    /// Returns the tick event while time remains, or `TimerFinished` on the
    /// poll that reaches zero. `None` when nothing is running.
    pub fn poll(&mut self, now: Instant) -> Option<Event> {
        let step = self.countdown.as_mut()?.poll(now);
        match step {
            CountdownStep::Tick(remaining_ms) => Some(self.on_tick(remaining_ms)),
            CountdownStep::Finished => Some(self.on_finish()),
        }
    }

    // ── Callbacks ────────────────────────────────────────────────────

    fn on_tick(&mut self, remaining_ms: u64) -> Event {
        self.remaining_ms = remaining_ms;
        let event = Event::Tick(self.snapshot());
        self.bus.publish(&event);
        self.refresh_notification();
        tracing::trace!(
            remaining = %crate::format::remaining_time_string(remaining_ms),
            "tick"
        );
        event
    }

    fn on_finish(&mut self) -> Event {
        self.countdown = None;
        self.remaining_ms = 0;
        self.bus.publish(&Event::Tick(self.snapshot()));
        self.cancel_notification(NotificationId::Ongoing);

        let finished = self.state;
        match finished {
            TimerState::Pomodoro => self.finish_pomodoro(),
            TimerState::Break => self.finish_break(),
            // start() only accepts countdown states
            TimerState::Ready | TimerState::Finished => {}
        }

        let event = Event::TimerFinished {
            finished,
            state: self.state,
            at: Utc::now(),
        };
        self.bus.publish(&event);
        event
    }

    fn finish_pomodoro(&mut self) {
        self.state = TimerState::Finished;
        tracing::info!("pomodoro finished");
        self.post_finished();
    }

    fn finish_break(&mut self) {
        self.state = TimerState::Ready;
        tracing::info!("break finished");
        self.post_finished();
    }

    // ── Notifications ────────────────────────────────────────────────

    fn ongoing_notification(&self) -> Notification {
        Notification::ongoing(
            self.state,
            self.remaining_ms,
            self.settings.minutes_for(self.state),
        )
    }

    fn start_notification(&mut self) {
        self.cancel_notification(NotificationId::Finished);
        let notification = self.ongoing_notification();
        self.show_notification(NotificationId::Ongoing, &notification);
    }

    fn refresh_notification(&mut self) {
        let notification = self.ongoing_notification();
        self.show_notification(NotificationId::Ongoing, &notification);
    }

    fn post_finished(&mut self) {
        let notification = Notification::finished(self.state);
        self.show_notification(NotificationId::Finished, &notification);
    }

    fn show_notification(&mut self, id: NotificationId, notification: &Notification) {
        if let Err(e) = self.notifier.notify(id, notification) {
            tracing::warn!(?id, error = %e, "failed to show notification");
        }
    }

    fn cancel_notification(&mut self, id: NotificationId) {
        if let Err(e) = self.notifier.cancel(id) {
            tracing::warn!(?id, error = %e, "failed to cancel notification");
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        if self.countdown.is_some() {
            self.cancel_notification(NotificationId::Ongoing);
        }
    }
}
