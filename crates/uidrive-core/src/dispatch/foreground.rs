use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::errors::DispatchError;
use crate::context::delay;
use crate::platform::{Platform, WindowHandle};

/// Saves the foreground window and puts it back.
///
/// Single slot, not reentrant. Restoration is best effort: failures are
/// logged and reported through the return value of `restore`. A guard
/// dropped without `restore` restores on drop.
pub struct ForegroundGuard {
    platform: Arc<dyn Platform>,
    previous: WindowHandle,
    restored: bool,
}

impl ForegroundGuard {
    /// Record the current foreground window.
    ///
    /// The OS can transiently report no foreground window, so the query is
    /// repeated up to `attempts` times, `interval` apart.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::NoForegroundWindow` when every query came back empty.
    pub async fn capture(
        platform: Arc<dyn Platform>,
        attempts: u32,
        interval: Duration,
    ) -> Result<Self, DispatchError> {
        for attempt in 1..=attempts {
            if let Some(previous) = platform.foreground_window() {
                debug!(
                    event = "core.dispatch.foreground_captured",
                    window = %previous,
                    attempt = attempt
                );
                return Ok(Self {
                    platform,
                    previous,
                    restored: false,
                });
            }
            if attempt < attempts {
                delay(interval).await;
            }
        }

        warn!(
            event = "core.dispatch.foreground_capture_failed",
            attempts = attempts
        );
        Err(DispatchError::NoForegroundWindow { attempts })
    }

    pub fn previous(&self) -> WindowHandle {
        self.previous
    }

    /// Put the saved window back into the foreground.
    ///
    /// Returns whether the foreground slot holds the saved window afterwards.
    pub fn restore(&mut self) -> bool {
        self.restored = true;
        let previous = self.previous;

        if self.platform.foreground_window() == Some(previous) {
            return true;
        }

        if !self.platform.is_window(previous) {
            warn!(
                event = "core.dispatch.foreground_restore_skipped",
                window = %previous,
                reason = "window closed"
            );
            return false;
        }

        if self.platform.set_foreground_window(previous) {
            debug!(event = "core.dispatch.foreground_restored", window = %previous);
            true
        } else {
            warn!(
                event = "core.dispatch.foreground_restore_failed",
                window = %previous
            );
            false
        }
    }
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        if !self.restored {
            self.restore();
        }
    }
}

impl std::fmt::Debug for ForegroundGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForegroundGuard")
            .field("previous", &self.previous)
            .field("restored", &self.restored)
            .finish()
    }
}
