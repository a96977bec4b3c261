//! Desktop notifications through the platform notification server.
//!
//! Talking to the notification server can block (D-Bus round trips on
//! freedesktop), so [`DesktopNotifier`] only queues requests. A dedicated
//! thread presents them; pending updates for the same slot collapse into the
//! latest one. After the first failure the worker downgrades to logging the
//! notifications instead of showing them.

use std::collections::BTreeMap;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::NotifyError;

use super::{Notification, NotificationId, Notifier};

#[cfg(all(unix, not(target_os = "macos")))]
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Show(NotificationId, Notification),
    Close(NotificationId),
}

impl Request {
    fn slot(&self) -> NotificationId {
        match self {
            Request::Show(id, _) | Request::Close(id) => *id,
        }
    }
}

/// Blocking presentation backend used by the worker thread.
trait Presenter {
    fn show(&mut self, id: NotificationId, notification: &Notification) -> Result<(), NotifyError>;
    fn close(&mut self, id: NotificationId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotifierKind {
    NotifyRust,
    LogOnly,
}

struct Worker<P> {
    presenter: P,
    kind: NotifierKind,
}

impl<P: Presenter> Worker<P> {
    fn new(presenter: P) -> Self {
        // Start optimistic; the first failure downgrades to LogOnly.
        Self {
            presenter,
            kind: NotifierKind::NotifyRust,
        }
    }

    /// Serve requests until every sender is gone.
    fn run(mut self, mut rx: mpsc::UnboundedReceiver<Request>) -> Self {
        while let Some(first) = rx.blocking_recv() {
            let mut pending = BTreeMap::new();
            pending.insert(first.slot(), first);
            while let Ok(next) = rx.try_recv() {
                pending.insert(next.slot(), next);
            }
            for request in pending.into_values() {
                self.handle(request);
            }
        }
        debug!("notification worker stopped");
        self
    }

    fn handle(&mut self, request: Request) {
        match (self.kind, request) {
            (NotifierKind::NotifyRust, Request::Show(id, notification)) => {
                if let Err(e) = self.presenter.show(id, &notification) {
                    warn!(error = %e, "notify-rust failed; downgrading to LogOnly notifier");
                    self.kind = NotifierKind::LogOnly;
                    log_notification(id, &notification);
                }
            }
            (NotifierKind::NotifyRust, Request::Close(id)) => self.presenter.close(id),
            (NotifierKind::LogOnly, Request::Show(id, notification)) => {
                log_notification(id, &notification)
            }
            (NotifierKind::LogOnly, Request::Close(id)) => {
                debug!(slot = id.raw(), "notification cleared");
            }
        }
    }
}

fn log_notification(id: NotificationId, notification: &Notification) {
    if id == NotificationId::Ongoing {
        debug!(title = %notification.title, body = %notification.body, "notification");
    } else {
        info!(title = %notification.title, body = %notification.body, "notification");
    }
}

/// Body text with the progress bar appended on its own line.
fn body_text(notification: &Notification) -> String {
    let mut body = notification.body.clone();
    if let Some(progress) = notification.progress {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&crate::format::progress_bar(progress.value, progress.max, 20));
    }
    body
}

/// notify-rust backend.
///
/// On freedesktop systems each slot maps to a fixed notification id so the
/// ongoing notification is updated in place and can be closed. Elsewhere
/// every update is a new toast and closing is a no-op.
struct NotifyRustPresenter {
    app_name: String,
    #[cfg(all(unix, not(target_os = "macos")))]
    handles: HashMap<u32, notify_rust::NotificationHandle>,
}

impl NotifyRustPresenter {
    fn new(app_name: String) -> Self {
        Self {
            app_name,
            #[cfg(all(unix, not(target_os = "macos")))]
            handles: HashMap::new(),
        }
    }
}

impl Presenter for NotifyRustPresenter {
    fn show(&mut self, id: NotificationId, notification: &Notification) -> Result<(), NotifyError> {
        let mut n = notify_rust::Notification::new();
        n.appname(&self.app_name)
            .summary(&notification.title)
            .body(&body_text(notification));
        if notification.ongoing {
            n.timeout(notify_rust::Timeout::Never);
        }

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            n.id(id.raw());
            let handle = n.show().map_err(|e| NotifyError::Backend(e.to_string()))?;
            self.handles.insert(id.raw(), handle);
        }

        #[cfg(not(all(unix, not(target_os = "macos"))))]
        {
            let _ = id;
            n.show()
                .map(|_| ())
                .map_err(|e| NotifyError::Backend(e.to_string()))?;
        }

        Ok(())
    }

    fn close(&mut self, id: NotificationId) {
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            if let Some(handle) = self.handles.remove(&id.raw()) {
                handle.close();
            }
        }

        #[cfg(not(all(unix, not(target_os = "macos"))))]
        let _ = id;
    }
}

/// Queues notifications for a background presenter thread.
///
/// `notify` and `cancel` never block. Dropping the notifier lets the worker
/// finish what is queued and waits for it.
pub struct DesktopNotifier {
    tx: Option<mpsc::UnboundedSender<Request>>,
    worker: Option<JoinHandle<()>>,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_presenter(NotifyRustPresenter::new(app_name.into()))
    }

    fn with_presenter<P: Presenter + Send + 'static>(presenter: P) -> Result<Self, NotifyError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = std::thread::Builder::new()
            .name("pomodroid-notify".into())
            .spawn(move || {
                Worker::new(presenter).run(rx);
            })
            .map_err(|e| NotifyError::Backend(format!("failed to start notification worker: {e}")))?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    fn enqueue(&self, request: Request) -> Result<(), NotifyError> {
        self.tx
            .as_ref()
            .and_then(|tx| tx.send(request).ok())
            .ok_or_else(|| NotifyError::Backend("notification worker stopped".into()))
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&mut self, id: NotificationId, notification: &Notification) -> Result<(), NotifyError> {
        self.enqueue(Request::Show(id, notification.clone()))
    }

    fn cancel(&mut self, id: NotificationId) -> Result<(), NotifyError> {
        self.enqueue(Request::Close(id))
    }
}

impl Drop for DesktopNotifier {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("notification worker panicked");
            }
        }
    }
}
