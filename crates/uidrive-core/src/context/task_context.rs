use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::task::AtomicWaker;
use tracing::{debug, info, warn};

use super::errors::BridgeError;
use super::executor::{TaskHandle, UiTask};
use super::host::UiHost;

/// How a context was bound at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    /// Created on the UI thread
    Bound,
    /// Created elsewhere; inline resumptions are recorded and reported by `close`
    DenyInline,
}

/// Per-test execution context bridging async drivers and the UI loop.
///
/// Spawned tasks are polled by the UI message loop, so code between two
/// suspension points of a spawned driver always runs on the UI thread.
pub struct TaskContext {
    host: Arc<dyn UiHost>,
    mode: ContextMode,
    violations: AtomicUsize,
    tasks: Mutex<Vec<oneshot::Receiver<()>>>,
}

impl TaskContext {
    pub fn new(host: Arc<dyn UiHost>) -> Self {
        let mode = if host.is_ui_thread() {
            ContextMode::Bound
        } else {
            ContextMode::DenyInline
        };
        debug!(event = "core.context.create_completed", mode = ?mode);

        Self {
            host,
            mode,
            violations: AtomicUsize::new(0),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn host(&self) -> &Arc<dyn UiHost> {
        &self.host
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }

    pub fn is_ui_thread(&self) -> bool {
        self.host.is_ui_thread()
    }

    /// Number of inline resumptions recorded by the deny-inline guard
    pub fn violation_count(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    /// Run `future` as a task polled by the UI loop.
    ///
    /// The handle resolves to `BridgeError::TaskDropped` if the loop shuts
    /// down first or the task panics.
    pub fn spawn<F>(&self, future: F) -> TaskHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (output_tx, output_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        let task = async move {
            let _done = done_tx;
            let output = future.await;
            let _ = output_tx.send(output);
        };

        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(done_rx);

        if let Err(e) = UiTask::schedule(Box::pin(task), self.host.clone()) {
            warn!(event = "core.context.spawn_failed", error = %e);
        }

        TaskHandle::new(output_rx)
    }

    /// Run `f` on the UI thread and return its result.
    ///
    /// Runs inline when already on the UI thread.
    pub async fn invoke<F, T>(&self, f: F) -> Result<T, BridgeError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.host.is_ui_thread() {
            return Ok(f());
        }

        let (sender, receiver) = oneshot::channel();
        self.host.post(Box::new(move || {
            let _ = sender.send(f());
        }))?;
        receiver.await.map_err(|_| BridgeError::TaskDropped)
    }

    /// Resume the awaiting task on the UI thread.
    ///
    /// Completes immediately on the UI thread. Elsewhere the wake goes through
    /// the UI queue; it only lands on the UI thread when the awaiting task is
    /// driven by the UI loop (see `spawn`). Any other resumption fails with
    /// `BridgeError::InlineResumption`.
    pub fn switch_to_ui_thread(&self) -> SwitchToUiThread<'_> {
        SwitchToUiThread {
            context: self,
            wake: None,
        }
    }

    /// Wait for every spawned task, then report any recorded violation.
    ///
    /// Must not be awaited from inside one of this context's own tasks.
    pub async fn close(&self) -> Result<(), BridgeError> {
        debug!(event = "core.context.close_started");

        loop {
            let pending = self.take_pending_tasks();
            if pending.is_empty() {
                break;
            }
            for done in pending {
                let _ = done.await;
            }
        }

        let violations = self.violation_count();
        if violations > 0 {
            warn!(
                event = "core.context.close_failed",
                violations = violations,
                error_code = "BRIDGE_INLINE_RESUMPTION"
            );
            return Err(BridgeError::InlineResumption);
        }

        info!(event = "core.context.close_completed");
        Ok(())
    }

    fn take_pending_tasks(&self) -> Vec<oneshot::Receiver<()>> {
        std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record_inline_resumption(&self) -> BridgeError {
        if self.mode == ContextMode::DenyInline {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        warn!(event = "core.context.inline_resumption_detected", mode = ?self.mode);
        BridgeError::InlineResumption
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("mode", &self.mode)
            .field("violations", &self.violation_count())
            .finish()
    }
}

#[derive(Default)]
struct SwitchWake {
    fired: AtomicBool,
    waker: AtomicWaker,
}

/// Future returned by `TaskContext::switch_to_ui_thread`
pub struct SwitchToUiThread<'a> {
    context: &'a TaskContext,
    wake: Option<Arc<SwitchWake>>,
}

impl Future for SwitchToUiThread<'_> {
    type Output = Result<(), BridgeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.context.host.is_ui_thread() {
            return Poll::Ready(Ok(()));
        }

        let Some(wake) = self.wake.clone() else {
            let wake = Arc::new(SwitchWake::default());
            wake.waker.register(cx.waker());

            let posted = wake.clone();
            let result = self.context.host.post(Box::new(move || {
                posted.fired.store(true, Ordering::SeqCst);
                posted.waker.wake();
            }));
            if let Err(e) = result {
                return Poll::Ready(Err(e));
            }

            self.wake = Some(wake);
            return Poll::Pending;
        };

        // Spurious poll before the posted wake ran.
        if !wake.fired.load(Ordering::SeqCst) {
            wake.waker.register(cx.waker());
            if !wake.fired.load(Ordering::SeqCst) {
                return Poll::Pending;
            }
        }

        Poll::Ready(Err(self.context.record_inline_resumption()))
    }
}
