use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};

use futures::channel::oneshot;
use tracing::{debug, warn};

type Registration = (Instant, oneshot::Sender<()>);

static TIMER: OnceLock<Option<mpsc::Sender<Registration>>> = OnceLock::new();

/// Future that completes after `duration`.
///
/// Every delay in the process is served by one lazily started timer thread,
/// so it works under any executor, including the UI loop. If the timer
/// thread cannot be started the delay completes at once.
pub fn delay(duration: Duration) -> Delay {
    let (sender, receiver) = oneshot::channel();

    if duration.is_zero() {
        let _ = sender.send(());
        return Delay { receiver };
    }

    let Some(deadline) = Instant::now().checked_add(duration) else {
        warn!(
            event = "core.context.delay_rejected",
            duration_ms = duration.as_millis() as u64,
            reason = "deadline overflow"
        );
        return Delay { receiver };
    };

    // Dropping the sender on failure completes the delay.
    if let Some(timer) = timer() {
        if timer.send((deadline, sender)).is_err() {
            warn!(event = "core.context.delay_rejected", reason = "timer stopped");
        }
    }

    Delay { receiver }
}

fn timer() -> Option<&'static mpsc::Sender<Registration>> {
    TIMER
        .get_or_init(|| {
            let (sender, receiver) = mpsc::channel();
            let spawned = thread::Builder::new()
                .name("uidrive-timer".to_string())
                .spawn(move || run_timer(receiver));
            match spawned {
                Ok(_) => {
                    debug!(event = "core.context.timer_started");
                    Some(sender)
                }
                Err(e) => {
                    warn!(event = "core.context.timer_spawn_failed", error = %e);
                    None
                }
            }
        })
        .as_ref()
}

/// Fire registrations in deadline order until every sender is gone.
fn run_timer(registrations: mpsc::Receiver<Registration>) {
    let mut pending: BTreeMap<(Instant, u64), oneshot::Sender<()>> = BTreeMap::new();
    let mut next_id = 0u64;

    loop {
        let now = Instant::now();
        while let Some(entry) = pending.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let _ = entry.remove().send(());
        }

        let received = match pending.keys().next() {
            Some(&(deadline, _)) => {
                registrations.recv_timeout(deadline.saturating_duration_since(now))
            }
            None => registrations
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok((deadline, sender)) => {
                pending.insert((deadline, next_id), sender);
                next_id += 1;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[derive(Debug)]
pub struct Delay {
    receiver: oneshot::Receiver<()>,
}

impl Future for Delay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        Pin::new(&mut self.receiver).poll(cx).map(|_| ())
    }
}
