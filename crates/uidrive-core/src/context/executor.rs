//! Tasks whose polls run on the UI thread.
//!
//! A task's waker posts "poll this task" onto the UI queue, so every
//! resumption of a spawned future happens inside the UI message loop.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::task::{ArcWake, waker_ref};
use tracing::{debug, error};

use super::errors::BridgeError;
use super::host::UiHost;

pub(crate) struct UiTask {
    future: Mutex<Option<BoxFuture<'static, ()>>>,
    host: Arc<dyn UiHost>,
    scheduled: AtomicBool,
    // Set when a poll was requested while the future was checked out by an
    // outer poll (nested modal loop).
    repoll: AtomicBool,
}

impl UiTask {
    /// Queue the first poll of `future` on the UI thread.
    pub(crate) fn schedule(
        future: BoxFuture<'static, ()>,
        host: Arc<dyn UiHost>,
    ) -> Result<(), BridgeError> {
        let task = Arc::new(UiTask {
            future: Mutex::new(Some(future)),
            host,
            scheduled: AtomicBool::new(true),
            repoll: AtomicBool::new(false),
        });
        let runner = task.clone();
        task.host.post(Box::new(move || runner.run()))
    }

    fn run(self: Arc<Self>) {
        self.scheduled.store(false, Ordering::SeqCst);

        let taken = self
            .future
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut future) = taken else {
            self.repoll.store(true, Ordering::SeqCst);
            return;
        };

        let waker = waker_ref(&self);
        let mut cx = Context::from_waker(&waker);
        let outcome = catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));

        match outcome {
            Ok(Poll::Ready(())) => {}
            Ok(Poll::Pending) => {
                *self.future.lock().unwrap_or_else(PoisonError::into_inner) = Some(future);
                if self.repoll.swap(false, Ordering::SeqCst) {
                    ArcWake::wake_by_ref(&self);
                }
            }
            Err(_) => {
                error!(event = "core.context.task_panicked");
            }
        }
    }
}

impl ArcWake for UiTask {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if arc_self.scheduled.swap(true, Ordering::SeqCst) {
            return;
        }

        let runner = arc_self.clone();
        if arc_self.host.post(Box::new(move || runner.run())).is_err() {
            debug!(event = "core.context.task_abandoned");
            let abandoned = arc_self
                .future
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            drop(abandoned);
        }
    }
}

/// Completion of a task started with `TaskContext::spawn`
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<T>) -> Self {
        Self { receiver }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, BridgeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| BridgeError::TaskDropped))
    }
}
