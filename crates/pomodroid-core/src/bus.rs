//! Publish/subscribe channel owned by the timer service.
//!
//! Subscribers are kept in an explicit list. Delivery is live only: an event
//! reaches the subscribers registered at the moment it is published and is
//! never buffered for anyone who subscribes later.
//!
//! Each subscriber has a bounded queue of [`SUBSCRIBER_CAPACITY`] events. A
//! subscriber that stops reading loses new events once its queue is full;
//! it is not removed and the publisher never waits for it.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::events::Event;

/// Events held per subscriber before further ones are dropped.
pub const SUBSCRIBER_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Receiving end handed to a subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event. `None` once the subscriber was removed and
    /// everything already delivered has been drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Next already-delivered event, if any.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Drain every event delivered so far.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

#[derive(Debug, Default)]
struct Subscribers {
    next_id: u64,
    list: Vec<(SubscriberId, mpsc::Sender<Event>)>,
}

/// Cloneable handle to a shared subscriber list.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        // A panic while holding the lock cannot leave the list half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        let mut subs = self.lock();
        let id = SubscriberId(subs.next_id);
        subs.next_id += 1;
        subs.list.push((id, tx));
        tracing::debug!(subscriber = id.0, "subscriber added");
        Subscription { id, rx }
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subs = self.lock();
        let before = subs.list.len();
        subs.list.retain(|(sid, _)| *sid != id);
        let removed = subs.list.len() != before;
        if removed {
            tracing::debug!(subscriber = id.0, "subscriber removed");
        }
        removed
    }

    /// Deliver `event` to every live subscriber and return how many got it.
    /// Subscribers whose receiver was dropped are pruned; subscribers with a
    /// full queue miss this event but stay registered.
    pub fn publish(&self, event: &Event) -> usize {
        let mut subs = self.lock();
        let mut delivered = 0;
        subs.list.retain(|(id, tx)| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::trace!(subscriber = id.0, "subscriber queue full, event dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(subscriber = id.0, "subscriber gone, pruned");
                false
            }
        });
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Tick;
    use crate::timer::TimerState;

    fn tick(ms: u64) -> Event {
        Event::Tick(Tick::new(ms, TimerState::Pomodoro))
    }

    #[test]
    fn publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_ne!(a.id(), b.id());

        assert_eq!(bus.publish(&tick(3_000)), 2);
        assert_eq!(a.drain(), vec![tick(3_000)]);
        assert_eq!(b.drain(), vec![tick(3_000)]);
    }

    #[test]
    fn late_subscriber_sees_no_history() {
        let bus = EventBus::new();
        bus.publish(&tick(3_000));
        let mut late = bus.subscribe();
        bus.publish(&tick(2_000));
        assert_eq!(late.drain(), vec![tick(2_000)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
        assert_eq!(bus.publish(&tick(1_000)), 0);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let _keep = bus.subscribe();
        drop(sub);
        assert_eq!(bus.publish(&tick(1_000)), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn stalled_subscriber_is_bounded_and_kept() {
        let bus = EventBus::new();
        let mut stalled = bus.subscribe();
        let mut live = bus.subscribe();

        let total = SUBSCRIBER_CAPACITY as u64 + 10;
        let mut delivered = Vec::new();
        for i in 0..total {
            delivered.push(bus.publish(&tick(i)));
            live.drain();
        }
        assert_eq!(delivered[0], 2);
        assert_eq!(delivered[SUBSCRIBER_CAPACITY], 1);
        assert_eq!(bus.subscriber_count(), 2);

        let held = stalled.drain();
        assert_eq!(held.len(), SUBSCRIBER_CAPACITY);
        assert_eq!(held.first(), Some(&tick(0)));

        // Once drained it receives again.
        assert_eq!(bus.publish(&tick(total)), 2);
        assert_eq!(stalled.drain(), vec![tick(total)]);
    }

    #[tokio::test]
    async fn recv_ends_after_unsubscribe() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.publish(&tick(1_000));
        bus.unsubscribe(sub.id());
        assert_eq!(sub.recv().await, Some(tick(1_000)));
        assert_eq!(sub.recv().await, None);
    }
}
