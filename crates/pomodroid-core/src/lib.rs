//! # Pomodroid Core Library
//!
//! This library provides the core logic of the Pomodroid Pomodoro timer: a
//! single countdown service that ticks once per second, reports every tick to
//! its subscribers and keeps a system notification in sync. The `pomodroid`
//! binary is a thin terminal front-end over the same library.
//!
//! ## Architecture
//!
//! - **Timer Service**: owns the countdown and the four-state life cycle
//!   (ready, pomodoro, finished, break); polled by an async driver
//! - **Event Bus**: explicit subscriber list receiving tick and life cycle
//!   events, live delivery only
//! - **Notifier**: pluggable notification backend (desktop, in-memory, none)
//! - **Display**: remaining-time view that listens only while visible
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerService`]: countdown state owner
//! - [`ServiceHandle`]: handle to a service running on a tokio task
//! - [`EventBus`]: publish/subscribe channel for [`Event`]s
//! - [`Config`]: application configuration management

pub mod bus;
pub mod display;
pub mod error;
pub mod events;
pub mod format;
pub mod notify;
pub mod storage;
pub mod timer;

pub use bus::{EventBus, SubscriberId, Subscription, SUBSCRIBER_CAPACITY};
pub use display::{Display, Listening};
pub use error::{ConfigError, NotifyError, TimerError};
pub use events::{Event, Tick};
pub use notify::{DesktopNotifier, MemoryNotifier, Notification, NotificationId, Notifier, NullNotifier};
pub use storage::Config;
pub use timer::{spawn_service, ServiceHandle, StartPolicy, TimerService, TimerSettings, TimerState};
