mod countdown;
pub mod driver;
mod service;
mod state;

pub use countdown::{Countdown, CountdownStep};
pub use driver::{spawn_service, Command, ServiceHandle};
pub use service::{StartPolicy, TimerService, TimerSettings};
pub use state::TimerState;
