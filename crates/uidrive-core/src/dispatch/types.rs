use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DriveConfig;
use crate::platform::WindowHandle;

/// Dispatcher tuning resolved from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub normalized_bias: i32,
    pub cursor_retry_delay: Duration,
    pub cursor_retry_attempts: u32,
    pub foreground_poll_attempts: u32,
    pub foreground_poll_interval: Duration,
}

impl From<&DriveConfig> for DispatchSettings {
    fn from(config: &DriveConfig) -> Self {
        Self {
            normalized_bias: config.calibration.normalized_bias(),
            cursor_retry_delay: config.calibration.cursor_retry_delay(),
            cursor_retry_attempts: config.calibration.cursor_retry_attempts(),
            foreground_poll_attempts: config.focus.foreground_poll_attempts(),
            foreground_poll_interval: config.focus.foreground_poll_interval(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&DriveConfig::default())
    }
}

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub window: WindowHandle,
    /// Number of primitives built by the action closure
    pub actions: usize,
    /// Number of native events the backend inserted
    pub injected: usize,
    pub foreground_restored: bool,
    pub waited_for_idle: bool,
}
