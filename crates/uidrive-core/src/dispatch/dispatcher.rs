use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use futures::channel::oneshot;
use tracing::{debug, error, info, warn};

use super::errors::DispatchError;
use super::foreground::ForegroundGuard;
use super::types::{DispatchReport, DispatchSettings};
use crate::config::DriveConfig;
use crate::context::delay;
use crate::errors::DriveError;
use crate::geometry::{Rect, ScreenPoint};
use crate::idle::IdleBarrier;
use crate::input::{InputAction, Injector, KeyInput, append_key_inputs};
use crate::platform::{Platform, WindowHandle};

/// Injects input into a window after forcing it into the foreground.
///
/// At most one `send` may be in flight per dispatcher; a concurrent call
/// fails with `DispatchError::InvalidArgument`.
pub struct InputDispatcher {
    platform: Arc<dyn Platform>,
    settings: DispatchSettings,
    idle: Option<IdleBarrier>,
    in_flight: AtomicBool,
}

impl InputDispatcher {
    pub fn new(platform: Arc<dyn Platform>, config: &DriveConfig) -> Self {
        Self::with_settings(platform, DispatchSettings::from(config))
    }

    pub fn with_settings(platform: Arc<dyn Platform>, settings: DispatchSettings) -> Self {
        Self {
            platform,
            settings,
            idle: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Wait for the UI loop to go idle after every successful send
    pub fn with_idle_barrier(mut self, idle: IdleBarrier) -> Self {
        self.idle = Some(idle);
        self
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Inject the actions recorded by `build` into `window`.
    ///
    /// The window must be open, visible and already the foreground window.
    /// It is then raised, activated and focused; the actions are injected on
    /// a worker thread and the previous foreground window is restored.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - window closed or hidden, empty action sequence,
    ///   or another send in flight
    /// * `Unsupported` - the window is not the current foreground window
    /// * `FocusRejected` - the OS refused foreground activation
    /// * `NativeCall` - an OS call failed
    pub async fn send<F>(
        &self,
        window: WindowHandle,
        build: F,
    ) -> Result<DispatchReport, DispatchError>
    where
        F: FnOnce(&mut Injector),
    {
        info!(
            event = "core.dispatch.send_started",
            window = %window,
            backend = self.platform.name()
        );

        let result = self.send_sequence(window, build).await;

        match &result {
            Ok(report) => info!(
                event = "core.dispatch.send_completed",
                window = %window,
                actions = report.actions,
                injected = report.injected,
                foreground_restored = report.foreground_restored
            ),
            Err(e) => error!(
                event = "core.dispatch.send_failed",
                window = %window,
                error = %e,
                error_code = e.error_code()
            ),
        }

        result
    }

    /// Type a list of key inputs into `window`.
    ///
    /// Line breaks inside text items become `Return` presses.
    pub async fn send_keys(
        &self,
        window: WindowHandle,
        keys: &[KeyInput],
    ) -> Result<DispatchReport, DispatchError> {
        if keys.is_empty() {
            return Err(DispatchError::InvalidArgument {
                reason: "key list is empty".to_string(),
            });
        }
        self.send(window, |injector| append_key_inputs(injector, keys))
            .await
    }

    /// Move the cursor to `point` and verify it arrived.
    ///
    /// The cursor is read back after the move. On a mismatch it is read again
    /// after the configured retry delay, up to the configured attempts.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::CursorMismatch` when the cursor never reports
    /// the requested position, plus every error of `send`.
    pub async fn move_mouse_to(
        &self,
        window: WindowHandle,
        point: ScreenPoint,
    ) -> Result<DispatchReport, DispatchError> {
        info!(
            event = "core.dispatch.move_mouse_started",
            window = %window,
            x = point.x,
            y = point.y
        );

        let report = self
            .send(window, |injector| {
                injector.move_mouse_to(point);
            })
            .await?;
        self.verify_cursor(point).await?;

        info!(
            event = "core.dispatch.move_mouse_completed",
            window = %window,
            x = point.x,
            y = point.y
        );
        Ok(report)
    }

    /// Move the cursor to the centre of a screen rectangle
    pub async fn move_mouse_to_rect_center(
        &self,
        window: WindowHandle,
        rect: Rect,
    ) -> Result<DispatchReport, DispatchError> {
        self.move_mouse_to(window, rect.center()).await
    }

    async fn send_sequence<F>(
        &self,
        window: WindowHandle,
        build: F,
    ) -> Result<DispatchReport, DispatchError>
    where
        F: FnOnce(&mut Injector),
    {
        let _in_flight = InFlight::acquire(&self.in_flight)?;

        self.validate_window(window)?;
        let actions = self.build_actions(build)?;
        let action_count = actions.len();

        let mut guard = ForegroundGuard::capture(
            self.platform.clone(),
            self.settings.foreground_poll_attempts,
            self.settings.foreground_poll_interval,
        )
        .await?;

        let injected = self
            .activate_and_inject(window, guard.previous(), actions)
            .await;
        let foreground_restored = guard.restore();
        let injected = injected?;

        let waited_for_idle = match &self.idle {
            Some(idle) => {
                idle.wait().await?;
                true
            }
            None => false,
        };

        Ok(DispatchReport {
            window,
            actions: action_count,
            injected,
            foreground_restored,
            waited_for_idle,
        })
    }

    fn validate_window(&self, window: WindowHandle) -> Result<(), DispatchError> {
        if !self.platform.is_window(window) {
            return Err(DispatchError::InvalidArgument {
                reason: format!("window {} does not exist", window),
            });
        }
        if !self.platform.is_window_visible(window) {
            return Err(DispatchError::InvalidArgument {
                reason: format!("window {} is not visible", window),
            });
        }
        Ok(())
    }

    fn build_actions<F>(&self, build: F) -> Result<Vec<InputAction>, DispatchError>
    where
        F: FnOnce(&mut Injector),
    {
        let screen = self.platform.screen_resolution()?;
        let mut injector = Injector::new(screen, self.settings.normalized_bias)?;
        build(&mut injector);

        if injector.is_empty() {
            return Err(DispatchError::InvalidArgument {
                reason: "action sequence is empty".to_string(),
            });
        }
        Ok(injector.into_actions())
    }

    async fn activate_and_inject(
        &self,
        window: WindowHandle,
        foreground: WindowHandle,
        actions: Vec<InputAction>,
    ) -> Result<usize, DispatchError> {
        if foreground != window {
            return Err(DispatchError::Unsupported { window, foreground });
        }

        self.activate(window)?;
        self.inject(actions).await
    }

    /// Raise, activate and focus the window.
    ///
    /// Focus transfer is not reliable from a single call, so the whole
    /// sequence is always issued.
    fn activate(&self, window: WindowHandle) -> Result<(), DispatchError> {
        debug!(event = "core.dispatch.activate_started", window = %window);

        self.platform.set_topmost(window, true)?;

        if !self.platform.set_foreground_window(window) {
            self.demote(window);
            return Err(DispatchError::FocusRejected { window });
        }

        if let Err(e) = self.platform.set_active_window(window) {
            debug!(
                event = "core.dispatch.set_active_failed",
                window = %window,
                error = %e
            );
        }
        if let Err(e) = self.platform.set_focus(window) {
            debug!(
                event = "core.dispatch.set_focus_failed",
                window = %window,
                error = %e
            );
        }

        self.demote(window);
        debug!(event = "core.dispatch.activate_completed", window = %window);
        Ok(())
    }

    fn demote(&self, window: WindowHandle) {
        if let Err(e) = self.platform.set_topmost(window, false) {
            warn!(
                event = "core.dispatch.demote_failed",
                window = %window,
                error = %e
            );
        }
    }

    /// Run the blocking injection call on a worker thread.
    async fn inject(&self, actions: Vec<InputAction>) -> Result<usize, DispatchError> {
        let platform = self.platform.clone();
        let (sender, receiver) = oneshot::channel();

        thread::Builder::new()
            .name("uidrive-inject".to_string())
            .spawn(move || {
                let _ = sender.send(platform.send_input(&actions));
            })
            .map_err(|e| DispatchError::InjectionThread {
                message: e.to_string(),
            })?;

        let result = receiver
            .await
            .map_err(|_| DispatchError::InjectionThread {
                message: "injection thread exited without a result".to_string(),
            })?;
        Ok(result?)
    }

    async fn verify_cursor(&self, expected: ScreenPoint) -> Result<(), DispatchError> {
        let mut actual = self.platform.cursor_position()?;
        let mut retries = 0;

        while actual != expected && retries < self.settings.cursor_retry_attempts {
            retries += 1;
            debug!(
                event = "core.dispatch.cursor_retry",
                expected = %expected,
                actual = %actual,
                retry = retries
            );
            delay(self.settings.cursor_retry_delay).await;
            actual = self.platform.cursor_position()?;
        }

        if actual != expected {
            return Err(DispatchError::CursorMismatch { expected, actual });
        }
        Ok(())
    }
}

impl std::fmt::Debug for InputDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDispatcher")
            .field("backend", &self.platform.name())
            .field("settings", &self.settings)
            .field("idle", &self.idle.is_some())
            .finish()
    }
}

/// Marks a send as in flight until dropped
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, DispatchError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| DispatchError::InvalidArgument {
                reason: "another send is already in flight".to_string(),
            })?;
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
