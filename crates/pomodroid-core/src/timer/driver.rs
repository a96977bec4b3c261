//! Async driver for [`TimerService`].
//!
//! One tokio task owns the service and multiplexes a one-second interval with
//! incoming commands, so every callback runs on that task and the service
//! needs no locking.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{TimerService, TimerState};
use crate::bus::{EventBus, Subscription};
use crate::error::TimerError;
use crate::events::{Event, Tick};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum Command {
    Start {
        state: TimerState,
        reply: oneshot::Sender<Result<Event, TimerError>>,
    },
    Stop {
        reply: oneshot::Sender<Option<Event>>,
    },
    Snapshot {
        reply: oneshot::Sender<Tick>,
    },
    Shutdown,
}

/// Handle to a service running on its own task.
pub struct ServiceHandle {
    tx: mpsc::UnboundedSender<Command>,
    bus: EventBus,
    task: JoinHandle<TimerService>,
}

/// Move `service` onto a new tokio task and return a handle to it.
pub fn spawn_service(service: TimerService) -> ServiceHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let bus = service.bus().clone();
    let task = tokio::spawn(run(service, rx));
    ServiceHandle { tx, bus, task }
}

impl ServiceHandle {
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, TimerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| TimerError::ServiceGone)?;
        rx.await.map_err(|_| TimerError::ServiceGone)
    }

    pub async fn start(&self, state: TimerState) -> Result<Event, TimerError> {
        self.request(|reply| Command::Start { state, reply }).await?
    }

    pub async fn stop(&self) -> Result<Option<Event>, TimerError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Tick, TimerError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stop any countdown, end the task and hand the service back.
    pub async fn shutdown(self) -> Result<TimerService, TimerError> {
        // The task may already be gone; joining reports that.
        let _ = self.tx.send(Command::Shutdown);
        self.task.await.map_err(|e| {
            tracing::error!(error = %e, "timer service task failed");
            TimerError::ServiceGone
        })
    }
}

/// Service loop. Ends on `Command::Shutdown` or when every sender is gone.
pub async fn run(mut service: TimerService, mut rx: mpsc::UnboundedReceiver<Command>) -> TimerService {
    let mut ticker = time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Start { state, reply }) => {
                    let result = service.start(state, Instant::now());
                    if result.is_ok() {
                        // First tick one interval after the start.
                        ticker.reset();
                    }
                    let _ = reply.send(result);
                }
                Some(Command::Stop { reply }) => {
                    let _ = reply.send(service.stop());
                }
                Some(Command::Snapshot { reply }) => {
                    let _ = reply.send(service.snapshot());
                }
                Some(Command::Shutdown) | None => {
                    service.shutdown();
                    break;
                }
            },
            _ = ticker.tick(), if service.is_running() => {
                service.poll(Instant::now());
            }
        }
    }

    service
}
