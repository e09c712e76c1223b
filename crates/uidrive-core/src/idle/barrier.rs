use std::sync::{Arc, Mutex, PoisonError};

use futures::channel::oneshot;
use tracing::debug;

use super::errors::IdleError;
use crate::context::{Notification, NotificationHandler, Subscription, UiHost};

/// Wait until the UI loop has no pending work.
///
/// Subscribes to the idle and modal-loop-exited notifications, yields once
/// through the UI queue, then waits for whichever notification comes first.
/// Resolves right after the yield when no top-level window is open.
///
/// Both subscriptions are released on every exit path, including when the
/// returned future is dropped.
///
/// # Errors
///
/// Returns `IdleError::LoopClosed` if the loop shuts down before a signal.
pub async fn wait_for_idle(host: &Arc<dyn UiHost>) -> Result<(), IdleError> {
    debug!(event = "core.idle.wait_started");

    let (signal_tx, signal_rx) = oneshot::channel::<()>();
    let slot = Arc::new(Mutex::new(Some(signal_tx)));
    let handler: NotificationHandler = Arc::new(move || {
        let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    });

    let _idle = Subscription::new(host.clone(), Notification::Idle, handler.clone());
    let _modal = Subscription::new(host.clone(), Notification::ModalLoopExited, handler);

    let open_windows = yield_to_ui(host).await?;
    if open_windows == 0 {
        debug!(event = "core.idle.wait_completed", open_windows = 0);
        return Ok(());
    }

    signal_rx.await.map_err(|_| IdleError::LoopClosed)?;
    debug!(event = "core.idle.wait_completed", open_windows = open_windows);
    Ok(())
}

/// Post a no-op through the UI queue and wait for it to run.
///
/// Returns the open window count observed on the UI thread.
async fn yield_to_ui(host: &Arc<dyn UiHost>) -> Result<usize, IdleError> {
    let (sender, receiver) = oneshot::channel();
    let counter = host.clone();
    host.post(Box::new(move || {
        let _ = sender.send(counter.open_window_count());
    }))
    .map_err(|_| IdleError::LoopClosed)?;
    receiver.await.map_err(|_| IdleError::LoopClosed)
}

/// Reusable handle to `wait_for_idle` for one UI host
#[derive(Clone)]
pub struct IdleBarrier {
    host: Arc<dyn UiHost>,
}

impl IdleBarrier {
    pub fn new(host: Arc<dyn UiHost>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<dyn UiHost> {
        &self.host
    }

    pub async fn wait(&self) -> Result<(), IdleError> {
        wait_for_idle(&self.host).await
    }
}

impl std::fmt::Debug for IdleBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleBarrier").finish_non_exhaustive()
    }
}
