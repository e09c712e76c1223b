use std::sync::Arc;

use super::errors::PlatformError;
use super::traits::Platform;

/// Resolve the native backend for the current OS.
///
/// # Errors
///
/// Returns `PlatformError::Unavailable` on systems without an injection
/// backend. Tests use `sim::SimDesktop` there instead.
pub fn default_platform() -> Result<Arc<dyn Platform>, PlatformError> {
    #[cfg(windows)]
    {
        tracing::debug!(event = "core.platform.resolve_completed", backend = "win32");
        Ok(Arc::new(super::win32::Win32Platform::new()))
    }

    #[cfg(not(windows))]
    {
        tracing::warn!(
            event = "core.platform.resolve_failed",
            platform = std::env::consts::OS
        );
        Err(PlatformError::Unavailable {
            platform: std::env::consts::OS,
        })
    }
}
