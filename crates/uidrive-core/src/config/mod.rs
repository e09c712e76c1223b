//! # Configuration System
//!
//! Hierarchical TOML configuration for uidrive.
//!
//! ## Configuration Hierarchy
//!
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.uidrive/config.toml`
//! 3. **Project config** - `./.uidrive/config.toml`
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use uidrive_core::config::DriveConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DriveConfig::load_hierarchy()?;
//!     let bias = config.calibration.normalized_bias();
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{CalibrationConfig, DriveConfig, FocusConfig};
pub use validation::validate_config;

impl DriveConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }

    /// Copy with every unset field filled in from the built-in defaults
    pub fn resolved(&self) -> Self {
        Self {
            calibration: CalibrationConfig {
                normalized_bias: Some(self.calibration.normalized_bias()),
                cursor_retry_delay_ms: Some(
                    self.calibration.cursor_retry_delay().as_millis() as u64,
                ),
                cursor_retry_attempts: Some(self.calibration.cursor_retry_attempts()),
            },
            focus: FocusConfig {
                foreground_poll_attempts: Some(self.focus.foreground_poll_attempts()),
                foreground_poll_interval_ms: Some(
                    self.focus.foreground_poll_interval().as_millis() as u64,
                ),
            },
        }
    }
}
