use crate::config::defaults::{MAX_CURSOR_RETRY_DELAY_MS, MAX_NORMALIZED_BIAS};
use crate::config::types::DriveConfig;
use crate::errors::ConfigError;

/// Validate a fully merged configuration.
pub fn validate_config(config: &DriveConfig) -> Result<(), ConfigError> {
    let bias = config.calibration.normalized_bias();
    if !(-MAX_NORMALIZED_BIAS..=MAX_NORMALIZED_BIAS).contains(&bias) {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "calibration.normalized_bias must be within -{max}..={max}, got {bias}",
                max = MAX_NORMALIZED_BIAS
            ),
        });
    }

    let delay_ms = config.calibration.cursor_retry_delay().as_millis();
    if delay_ms > u128::from(MAX_CURSOR_RETRY_DELAY_MS) {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "calibration.cursor_retry_delay_ms must be at most {}, got {}",
                MAX_CURSOR_RETRY_DELAY_MS, delay_ms
            ),
        });
    }

    if config.focus.foreground_poll_attempts() == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "focus.foreground_poll_attempts must be at least 1".to_string(),
        });
    }

    Ok(())
}
