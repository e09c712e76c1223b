//! Process-level lifecycle events shared by the CLI and test suites.

use tracing::{error, info, warn};

use crate::errors::DriveError;

pub fn log_app_startup(command: &str) {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION"),
        command = command,
        os = std::env::consts::OS
    );
}

pub fn log_app_shutdown(success: bool) {
    info!(event = "core.app.shutdown_started", success = success);
}

/// Log a failed operation with its stable error code.
///
/// User errors (bad input, broken config) are logged at warn level.
pub fn log_app_error(error: &dyn DriveError) {
    if error.is_user_error() {
        warn!(
            event = "core.app.error_occurred",
            error = %error,
            error_code = error.error_code(),
            user_error = true
        );
    } else {
        error!(
            event = "core.app.error_occurred",
            error = %error,
            error_code = error.error_code(),
            user_error = false
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    #[test]
    fn test_app_events() {
        log_app_startup("selftest");
        log_app_shutdown(true);

        log_app_error(&ConfigError::InvalidConfiguration {
            message: "bias out of range".to_string(),
        });
        log_app_error(&ConfigError::HomeDirectoryNotFound);
    }
}
