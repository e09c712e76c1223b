//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.uidrive/config.toml`
//! 3. **Project config** - `./.uidrive/config.toml`
//! 4. **CLI arguments** - Command-line flags (highest priority)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use crate::config::types::{CalibrationConfig, DriveConfig, FocusConfig};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

/// Load configuration from the user and project config files.
///
/// # Errors
///
/// Returns an error if a file exists but cannot be parsed, or if validation
/// fails. Missing config files are not errors.
pub fn load_hierarchy() -> Result<DriveConfig, ConfigError> {
    let user_path = user_config_path().ok();
    let project_path = project_config_path().ok();
    load_from_paths(user_path.as_deref(), project_path.as_deref())
}

/// Load and merge configuration from explicit file locations.
///
/// `None` or a path that does not exist contributes nothing.
pub fn load_from_paths(
    user_path: Option<&Path>,
    project_path: Option<&Path>,
) -> Result<DriveConfig, ConfigError> {
    let mut config = DriveConfig::default();

    for path in [user_path, project_path].into_iter().flatten() {
        match load_config_file(path) {
            Ok(layer) => config = merge_configs(config, layer),
            Err(e) if e.is_file_not_found() => {
                debug!(
                    event = "core.config.file_skipped",
                    path = %path.display()
                );
            }
            Err(e) => return Err(e),
        }
    }

    validate_config(&config)?;

    Ok(config)
}

/// Path of the user configuration file (`~/.uidrive/config.toml`).
pub fn user_config_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::HomeDirectoryNotFound)?;
    Ok(home_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Path of the project configuration file (`./.uidrive/config.toml`).
pub fn project_config_path() -> Result<PathBuf, ConfigError> {
    Ok(std::env::current_dir()?
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

/// Load a configuration file from the given path.
fn load_config_file(path: &Path) -> Result<DriveConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    let config: DriveConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    debug!(event = "core.config.file_loaded", path = %path.display());
    Ok(config)
}

/// Merge two configurations, with `override_config` taking precedence.
///
/// Override values replace base values only when present.
pub fn merge_configs(base: DriveConfig, override_config: DriveConfig) -> DriveConfig {
    DriveConfig {
        calibration: CalibrationConfig {
            normalized_bias: override_config
                .calibration
                .normalized_bias
                .or(base.calibration.normalized_bias),
            cursor_retry_delay_ms: override_config
                .calibration
                .cursor_retry_delay_ms
                .or(base.calibration.cursor_retry_delay_ms),
            cursor_retry_attempts: override_config
                .calibration
                .cursor_retry_attempts
                .or(base.calibration.cursor_retry_attempts),
        },
        focus: FocusConfig {
            foreground_poll_attempts: override_config
                .focus
                .foreground_poll_attempts
                .or(base.focus.foreground_poll_attempts),
            foreground_poll_interval_ms: override_config
                .focus
                .foreground_poll_interval_ms
                .or(base.focus.foreground_poll_interval_ms),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from_paths(
            Some(&dir.path().join("nope.toml")),
            Some(&dir.path().join("also-nope.toml")),
        )
        .unwrap();
        assert_eq!(config, DriveConfig::default());
    }

    #[test]
    fn test_project_overrides_user() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let project = dir.path().join("project.toml");
        fs::write(
            &user,
            "[calibration]\nnormalized_bias = 2\ncursor_retry_delay_ms = 40\n",
        )
        .unwrap();
        fs::write(&project, "[calibration]\nnormalized_bias = 0\n").unwrap();

        let config = load_from_paths(Some(&user), Some(&project)).unwrap();
        assert_eq!(config.calibration.normalized_bias(), 0);
        assert_eq!(config.calibration.cursor_retry_delay_ms, Some(40));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        fs::write(&user, "[calibration\nnormalized_bias = ").unwrap();

        let err = load_from_paths(Some(&user), None).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_invalid_merged_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.toml");
        fs::write(&project, "[focus]\nforeground_poll_attempts = 0\n").unwrap();

        let err = load_from_paths(None, Some(&project)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_merge_keeps_base_when_override_unset() {
        let base = DriveConfig {
            focus: FocusConfig {
                foreground_poll_attempts: Some(7),
                foreground_poll_interval_ms: Some(1),
            },
            ..Default::default()
        };
        let merged = merge_configs(base, DriveConfig::default());
        assert_eq!(merged.focus.foreground_poll_attempts, Some(7));
        assert_eq!(merged.focus.foreground_poll_interval_ms, Some(1));
    }

    #[test]
    fn test_config_paths_end_with_config_file() {
        let project = project_config_path().unwrap();
        assert!(project.ends_with(".uidrive/config.toml"));
    }
}
