//! Remaining-time display.
//!
//! Mirrors a foreground screen: it listens to the service's ticks only while
//! visible ([`Display::resume`] .. [`Display::pause`]) and renders each one as
//! a line of text. Ticks published while paused are not replayed.

use crate::bus::{EventBus, Subscription};
use crate::events::{Event, Tick};
use crate::format::remaining_time_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listening {
    Subscribed,
    Unsubscribed,
}

#[derive(Debug, Default)]
pub struct Display {
    subscription: Option<Subscription>,
    text: String,
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listening(&self) -> Listening {
        if self.subscription.is_some() {
            Listening::Subscribed
        } else {
            Listening::Unsubscribed
        }
    }

    /// Start listening. A second call keeps the existing subscription.
    pub fn resume(&mut self, bus: &EventBus) {
        if self.subscription.is_none() {
            self.subscription = Some(bus.subscribe());
        }
    }

    /// Stop listening and drop anything not yet rendered.
    pub fn pause(&mut self, bus: &EventBus) {
        if let Some(sub) = self.subscription.take() {
            bus.unsubscribe(sub.id());
        }
    }

    /// Last rendered text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn handle(&mut self, tick: &Tick) -> &str {
        self.text = format!("Time remaining: {}", remaining_time_string(tick.remaining_ms));
        &self.text
    }

    /// Wait for the next event while subscribed, rendering ticks on the way.
    /// Returns `None` immediately when not subscribed.
    pub async fn next_event(&mut self) -> Option<Event> {
        let event = self.subscription.as_mut()?.recv().await?;
        if let Event::Tick(tick) = &event {
            self.handle(tick);
        }
        Some(event)
    }

    /// Render everything already delivered without waiting.
    pub fn pump(&mut self) -> Vec<Event> {
        let events = match self.subscription.as_mut() {
            Some(sub) => sub.drain(),
            None => return Vec::new(),
        };
        for event in &events {
            if let Event::Tick(tick) = event {
                self.handle(tick);
            }
        }
        events
    }
}
