//! OS facility traits the dispatcher is written against.

use super::errors::PlatformError;
use super::types::WindowHandle;
use crate::geometry::{ScreenPoint, ScreenSize};
use crate::input::InputAction;

/// Low-level input injection.
///
/// Implementations synthesize hardware-level events; the OS (or the
/// simulated desktop) routes them to whichever window it chooses.
pub trait InputBackend: Send + Sync {
    /// Short backend name for logging (e.g., "win32", "simulated").
    fn name(&self) -> &'static str;

    /// Resolution of the primary display in pixels.
    fn screen_resolution(&self) -> Result<ScreenSize, PlatformError>;

    /// Inject the actions in order.
    ///
    /// # Returns
    /// * `Ok(count)` - Number of native events inserted
    /// * `Err(PlatformError::InputBlocked)` - The OS accepted only part of the input
    /// * `Err(PlatformError::NativeCall)` - The injection call failed
    fn send_input(&self, actions: &[InputAction]) -> Result<usize, PlatformError>;

    /// Current cursor position in pixels.
    fn cursor_position(&self) -> Result<ScreenPoint, PlatformError>;
}

/// Window activation primitives.
///
/// Each call maps to one OS request. Focus transfer is unreliable from any
/// single call, so callers issue them in a fixed sequence.
pub trait WindowManager: Send + Sync {
    /// The window currently receiving keyboard input, if the OS reports one.
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// Request foreground activation. Returns false when the OS refuses.
    fn set_foreground_window(&self, window: WindowHandle) -> bool;

    /// Move the window into or out of the topmost z-order band.
    fn set_topmost(&self, window: WindowHandle, topmost: bool) -> Result<(), PlatformError>;

    fn set_active_window(&self, window: WindowHandle) -> Result<(), PlatformError>;

    fn set_focus(&self, window: WindowHandle) -> Result<(), PlatformError>;

    /// Whether the handle names an existing window.
    fn is_window(&self, window: WindowHandle) -> bool;

    fn is_window_visible(&self, window: WindowHandle) -> bool;
}

/// Everything the dispatcher needs from the OS.
pub trait Platform: InputBackend + WindowManager {}

impl<T: InputBackend + WindowManager + ?Sized> Platform for T {}
