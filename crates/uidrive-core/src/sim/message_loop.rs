//! A UI thread with a single FIFO message queue.
//!
//! The loop raises `Notification::Idle` each time the queue drains and
//! `Notification::ModalLoopExited` when a nested modal loop returns.

use std::collections::{BTreeMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, error, info};

use super::errors::SimError;
use crate::context::{
    BridgeError, Notification, NotificationHandler, SubscriptionId, UiCallback, UiHost,
};

#[derive(Default)]
struct LoopState {
    queue: VecDeque<UiCallback>,
    handlers: BTreeMap<SubscriptionId, (Notification, NotificationHandler)>,
    closed: bool,
    modal_depth: usize,
}

struct LoopShared {
    state: Mutex<LoopState>,
    wakeup: Condvar,
    ui_thread: OnceLock<ThreadId>,
    open_windows: AtomicUsize,
    next_subscription: AtomicU64,
}

impl LoopShared {
    fn lock(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_callback(&self) -> Option<UiCallback> {
        let mut state = self.lock();
        loop {
            if let Some(callback) = state.queue.pop_front() {
                return Some(callback);
            }
            if state.closed {
                return None;
            }
            state = self
                .wakeup
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn handlers_for(&self, notification: Notification) -> Vec<NotificationHandler> {
        self.lock()
            .handlers
            .values()
            .filter(|(kind, _)| *kind == notification)
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    /// Raise idle to the handlers registered right now, if the queue is empty.
    fn raise_idle_if_drained(&self) {
        let handlers = {
            let state = self.lock();
            if !state.queue.is_empty() || state.closed {
                return;
            }
            state
                .handlers
                .values()
                .filter(|(kind, _)| *kind == Notification::Idle)
                .map(|(_, handler)| handler.clone())
                .collect::<Vec<_>>()
        };
        for handler in handlers {
            run_guarded(move || handler());
        }
    }

    /// Run callbacks until `until` holds. Returns false if the loop closed.
    fn pump(&self, until: &dyn Fn() -> bool) -> bool {
        loop {
            if until() {
                return true;
            }
            let Some(callback) = self.next_callback() else {
                return false;
            };
            run_guarded(callback);
            self.raise_idle_if_drained();
        }
    }
}

fn run_guarded(callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        error!(event = "core.sim.callback_panicked");
    }
}

/// Cloneable handle to the UI thread's loop; implements `UiHost`
#[derive(Clone)]
pub struct UiHandle {
    shared: Arc<LoopShared>,
}

impl UiHandle {
    /// Pump a nested modal loop until `until` returns true.
    ///
    /// Raises `Notification::ModalLoopExited` on the way out.
    ///
    /// # Errors
    ///
    /// `SimError::CrossThreadAccess` off the UI thread, or
    /// `BridgeError::LoopClosed` if the loop shut down while pumping.
    pub fn run_modal(&self, until: &dyn Fn() -> bool) -> Result<(), SimError> {
        if !self.is_ui_thread() {
            return Err(SimError::CrossThreadAccess {
                operation: "UiHandle::run_modal",
            });
        }

        let depth = {
            let mut state = self.shared.lock();
            state.modal_depth += 1;
            state.modal_depth
        };
        debug!(event = "core.sim.modal_loop_started", depth = depth);

        let completed = self.shared.pump(until);

        self.shared.lock().modal_depth -= 1;
        debug!(event = "core.sim.modal_loop_exited", depth = depth);

        for handler in self.shared.handlers_for(Notification::ModalLoopExited) {
            run_guarded(move || handler());
        }

        if completed {
            Ok(())
        } else {
            Err(BridgeError::LoopClosed.into())
        }
    }

    /// Current nesting depth of modal loops
    pub fn modal_depth(&self) -> usize {
        self.shared.lock().modal_depth
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    pub(crate) fn window_opened(&self) {
        self.shared.open_windows.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn window_closed(&self) {
        let _ = self
            .shared
            .open_windows
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Stop accepting work; pending callbacks and subscriptions are dropped.
    fn close(&self) {
        let (queue, handlers) = {
            let mut state = self.shared.lock();
            state.closed = true;
            (
                std::mem::take(&mut state.queue),
                std::mem::take(&mut state.handlers),
            )
        };
        self.shared.wakeup.notify_all();
        debug!(
            event = "core.sim.ui_loop_closed",
            dropped_callbacks = queue.len(),
            dropped_subscriptions = handlers.len()
        );
    }
}

impl UiHost for UiHandle {
    fn post(&self, callback: UiCallback) -> Result<(), BridgeError> {
        {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(BridgeError::LoopClosed);
            }
            state.queue.push_back(callback);
        }
        self.shared.wakeup.notify_one();
        Ok(())
    }

    fn is_ui_thread(&self) -> bool {
        self.shared.ui_thread.get() == Some(&thread::current().id())
    }

    fn subscribe(
        &self,
        notification: Notification,
        handler: NotificationHandler,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.shared.next_subscription.fetch_add(1, Ordering::SeqCst));
        let mut state = self.shared.lock();
        // A closed loop never raises again; dropping the handler releases its waiters.
        if !state.closed {
            state.handlers.insert(id, (notification, handler));
        }
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let removed = self.shared.lock().handlers.remove(&id);
        drop(removed);
    }

    fn open_window_count(&self) -> usize {
        self.shared.open_windows.load(Ordering::SeqCst)
    }
}

/// Owner of the UI thread. Dropping it shuts the loop down and joins the thread.
pub struct UiThread {
    handle: UiHandle,
    thread: Option<JoinHandle<()>>,
}

impl UiThread {
    pub fn start() -> Result<Self, SimError> {
        let shared = Arc::new(LoopShared {
            state: Mutex::new(LoopState::default()),
            wakeup: Condvar::new(),
            ui_thread: OnceLock::new(),
            open_windows: AtomicUsize::new(0),
            next_subscription: AtomicU64::new(1),
        });

        let loop_shared = shared.clone();
        let thread = thread::Builder::new()
            .name("uidrive-ui".to_string())
            .spawn(move || {
                loop_shared.pump(&|| false);
                debug!(event = "core.sim.ui_thread_exited");
            })
            .map_err(|e| SimError::ThreadStart {
                message: e.to_string(),
            })?;
        let _ = shared.ui_thread.set(thread.thread().id());

        info!(event = "core.sim.ui_thread_started");
        Ok(Self {
            handle: UiHandle { shared },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    pub fn host(&self) -> Arc<dyn UiHost> {
        Arc::new(self.handle.clone())
    }

    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.handle.close();
        if !self.handle.is_ui_thread() {
            let _ = thread.join();
        }
        info!(event = "core.sim.ui_thread_stopped");
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}
