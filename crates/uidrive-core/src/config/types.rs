//! Configuration type definitions for uidrive.
//!
//! These types are deserialized from TOML config files. Every field is
//! optional so that a project file can override a single value from the
//! user file; accessors fall back to the built-in defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! [calibration]
//! normalized_bias = 1
//! cursor_retry_delay_ms = 15
//! cursor_retry_attempts = 1
//!
//! [focus]
//! foreground_poll_attempts = 100
//! foreground_poll_interval_ms = 5
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Main configuration loaded from TOML config files.
///
/// Loaded from:
/// 1. User config: `~/.uidrive/config.toml`
/// 2. Project config: `./.uidrive/config.toml`
///
/// Project config values override user config values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Platform calibration values for coordinate conversion
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// Foreground acquisition settings
    #[serde(default)]
    pub focus: FocusConfig,
}

/// Empirical calibration constants.
///
/// These depend on the target platform and display setup and should be
/// re-measured when moving to a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Offset added to both normalized axes of an absolute mouse move.
    /// Default: 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_bias: Option<i32>,

    /// Delay before re-reading the cursor after a mismatch.
    /// Default: 15ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_retry_delay_ms: Option<u64>,

    /// Number of extra cursor reads after a mismatch.
    /// Default: 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_retry_attempts: Option<u32>,
}

impl CalibrationConfig {
    pub fn normalized_bias(&self) -> i32 {
        self.normalized_bias
            .unwrap_or(defaults::DEFAULT_NORMALIZED_BIAS)
    }

    pub fn cursor_retry_delay(&self) -> Duration {
        Duration::from_millis(
            self.cursor_retry_delay_ms
                .unwrap_or(defaults::DEFAULT_CURSOR_RETRY_DELAY_MS),
        )
    }

    pub fn cursor_retry_attempts(&self) -> u32 {
        self.cursor_retry_attempts
            .unwrap_or(defaults::DEFAULT_CURSOR_RETRY_ATTEMPTS)
    }
}

/// Foreground window acquisition.
///
/// The OS can briefly report no foreground window while activation moves
/// between windows, so the query is retried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusConfig {
    /// How many times to query the foreground window before giving up.
    /// Default: 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_poll_attempts: Option<u32>,

    /// Pause between foreground queries.
    /// Default: 5ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_poll_interval_ms: Option<u64>,
}

impl FocusConfig {
    pub fn foreground_poll_attempts(&self) -> u32 {
        self.foreground_poll_attempts
            .unwrap_or(defaults::DEFAULT_FOREGROUND_POLL_ATTEMPTS)
    }

    pub fn foreground_poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.foreground_poll_interval_ms
                .unwrap_or(defaults::DEFAULT_FOREGROUND_POLL_INTERVAL_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = DriveConfig::default();
        assert_eq!(config.calibration.normalized_bias(), 1);
        assert_eq!(
            config.calibration.cursor_retry_delay(),
            Duration::from_millis(15)
        );
        assert_eq!(config.calibration.cursor_retry_attempts(), 1);
        assert_eq!(config.focus.foreground_poll_attempts(), 100);
        assert_eq!(
            config.focus.foreground_poll_interval(),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: DriveConfig = toml::from_str(
            r#"
[calibration]
normalized_bias = 0
"#,
        )
        .unwrap();
        assert_eq!(config.calibration.normalized_bias(), 0);
        assert_eq!(config.calibration.cursor_retry_attempts(), 1);
        assert_eq!(config.focus, FocusConfig::default());
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let config = DriveConfig {
            calibration: CalibrationConfig {
                cursor_retry_delay_ms: Some(30),
                ..Default::default()
            },
            ..Default::default()
        };
        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("cursor_retry_delay_ms = 30"));
        assert!(!rendered.contains("normalized_bias"));
    }
}
