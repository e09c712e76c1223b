//! Built-in fallback values for configuration fields.

/// Normalized-space offset applied to absolute mouse moves.
///
/// Without it, `round(65535 / width * x)` lands one pixel short for part of
/// the screen on the reference platform.
pub const DEFAULT_NORMALIZED_BIAS: i32 = 1;

/// Delay before the single cursor read-back retry.
pub const DEFAULT_CURSOR_RETRY_DELAY_MS: u64 = 15;

/// Extra cursor reads after the first mismatch.
pub const DEFAULT_CURSOR_RETRY_ATTEMPTS: u32 = 1;

pub const DEFAULT_FOREGROUND_POLL_ATTEMPTS: u32 = 100;

pub const DEFAULT_FOREGROUND_POLL_INTERVAL_MS: u64 = 5;

/// Largest accepted absolute value for the normalized bias.
pub const MAX_NORMALIZED_BIAS: i32 = 16;

/// Largest accepted cursor retry delay.
pub const MAX_CURSOR_RETRY_DELAY_MS: u64 = 1000;

/// Directory name used under the home directory and the project root.
pub const CONFIG_DIR_NAME: &str = ".uidrive";

pub const CONFIG_FILE_NAME: &str = "config.toml";
