use crate::errors::DriveError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    #[error("Native call {call} failed with error code {code}")]
    NativeCall { call: &'static str, code: i32 },

    #[error("Input injection blocked: {inserted} of {requested} events inserted")]
    InputBlocked { inserted: usize, requested: usize },

    #[error("No input injection backend is available on {platform}")]
    Unavailable { platform: &'static str },

    #[error("Invalid screen resolution reported: {width}x{height}")]
    InvalidResolution { width: i32, height: i32 },
}

impl DriveError for PlatformError {
    fn error_code(&self) -> &'static str {
        match self {
            PlatformError::NativeCall { .. } => "PLATFORM_NATIVE_CALL_FAILED",
            PlatformError::InputBlocked { .. } => "PLATFORM_INPUT_BLOCKED",
            PlatformError::Unavailable { .. } => "PLATFORM_UNAVAILABLE",
            PlatformError::InvalidResolution { .. } => "PLATFORM_INVALID_RESOLUTION",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, PlatformError::Unavailable { .. })
    }
}
