//! User-facing notifications.
//!
//! The timer service talks to a [`Notifier`]; which backend sits behind it is
//! decided at startup (desktop notifications, nothing at all, or an in-memory
//! recorder).

mod desktop;

pub use desktop::DesktopNotifier;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::NotifyError;
use crate::format::remaining_time_string;
use crate::timer::TimerState;

/// Fixed notification slots. Posting to a slot replaces what was there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationId {
    /// Updated every second while a countdown runs.
    Ongoing = 1001,
    /// Posted once when a countdown completes.
    Finished = 1002,
}

impl NotificationId {
    pub fn raw(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub max: u64,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub progress: Option<Progress>,
    /// Cannot be dismissed by the user while set.
    pub ongoing: bool,
    /// Activating the notification brings up the main screen.
    pub opens_main: bool,
}

impl Notification {
    /// Notification shown while a countdown runs.
    ///
    /// Progress is whole elapsed minutes against the configured run length.
    pub fn ongoing(state: TimerState, remaining_ms: u64, total_minutes: u64) -> Self {
        let remaining_minutes = remaining_ms / 60_000;
        let elapsed = total_minutes.saturating_sub(remaining_minutes);
        Self {
            title: state.title().to_string(),
            body: format!("Time remaining: {}", remaining_time_string(remaining_ms)),
            progress: Some(Progress {
                max: total_minutes,
                value: elapsed,
            }),
            ongoing: true,
            opens_main: true,
        }
    }

    /// Terminal notification posted once a countdown completes.
    pub fn finished(state: TimerState) -> Self {
        Self {
            title: state.title().to_string(),
            body: String::new(),
            progress: None,
            ongoing: false,
            opens_main: true,
        }
    }
}

/// Backend that displays notifications.
pub trait Notifier: Send {
    /// Show `notification` in slot `id`, replacing any previous content.
    fn notify(&mut self, id: NotificationId, notification: &Notification)
        -> Result<(), NotifyError>;

    /// Remove whatever is shown in slot `id`. Removing an empty slot is fine.
    fn cancel(&mut self, id: NotificationId) -> Result<(), NotifyError>;
}

/// Backend used when notifications are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _id: NotificationId, _n: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }

    fn cancel(&mut self, _id: NotificationId) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Notify(NotificationId, Notification),
    Cancel(NotificationId),
}

#[derive(Debug, Default)]
struct Recorded {
    calls: Vec<NotifierCall>,
    visible: BTreeMap<NotificationId, Notification>,
    fail: bool,
}

/// In-memory backend. Clones share the same record, so one clone can be
/// handed to the service while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    inner: Arc<Mutex<Recorded>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose every call fails after being recorded.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.lock().fail = true;
        notifier
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.lock().calls.clone()
    }

    /// Currently shown notification in slot `id`.
    pub fn visible(&self, id: NotificationId) -> Option<Notification> {
        self.lock().visible.get(&id).cloned()
    }

    /// Number of times slot `id` was posted to.
    pub fn post_count(&self, id: NotificationId) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, NotifierCall::Notify(nid, _) if *nid == id))
            .count()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&mut self, id: NotificationId, notification: &Notification) -> Result<(), NotifyError> {
        let mut rec = self.lock();
        rec.calls.push(NotifierCall::Notify(id, notification.clone()));
        if rec.fail {
            return Err(NotifyError::Backend("recorder set to fail".into()));
        }
        rec.visible.insert(id, notification.clone());
        Ok(())
    }

    fn cancel(&mut self, id: NotificationId) -> Result<(), NotifyError> {
        let mut rec = self.lock();
        rec.calls.push(NotifierCall::Cancel(id));
        if rec.fail {
            return Err(NotifyError::Backend("recorder set to fail".into()));
        }
        rec.visible.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ongoing_progress_counts_elapsed_minutes() {
        let n = Notification::ongoing(TimerState::Pomodoro, 20 * 60_000 + 30_000, 25);
        assert_eq!(n.title, "Running a pomodoro...");
        assert_eq!(n.body, "Time remaining: 20:30");
        assert_eq!(n.progress, Some(Progress { max: 25, value: 5 }));
        assert!(n.ongoing);
    }

    #[test]
    fn ongoing_progress_uses_configured_length() {
        let n = Notification::ongoing(TimerState::Break, 60_000, 5);
        assert_eq!(n.progress, Some(Progress { max: 5, value: 4 }));
    }

    #[test]
    fn finished_notification_opens_main() {
        let n = Notification::finished(TimerState::Finished);
        assert_eq!(n.title, "Congratulations! Pomodoro finished!");
        assert!(n.opens_main);
        assert!(!n.ongoing);
        assert!(n.progress.is_none());
    }

    #[test]
    fn memory_notifier_tracks_visible_slots() {
        let recorder = MemoryNotifier::new();
        let mut notifier = recorder.clone();
        let n = Notification::finished(TimerState::Ready);
        notifier.notify(NotificationId::Finished, &n).unwrap();
        assert_eq!(recorder.visible(NotificationId::Finished), Some(n));
        notifier.cancel(NotificationId::Finished).unwrap();
        assert!(recorder.visible(NotificationId::Finished).is_none());
        assert_eq!(recorder.calls().len(), 2);
    }

    #[test]
    fn failing_notifier_still_records() {
        let recorder = MemoryNotifier::failing();
        let mut notifier = recorder.clone();
        assert!(notifier.cancel(NotificationId::Ongoing).is_err());
        assert_eq!(recorder.calls(), vec![NotifierCall::Cancel(NotificationId::Ongoing)]);
    }
}
