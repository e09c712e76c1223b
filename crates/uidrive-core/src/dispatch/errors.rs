use crate::errors::DriveError;
use crate::geometry::{GeometryError, ScreenPoint};
use crate::idle::IdleError;
use crate::platform::{PlatformError, WindowHandle};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Window {window} refused foreground activation")]
    FocusRejected { window: WindowHandle },

    #[error("Native call {call} failed with error code {code}")]
    NativeCall { call: &'static str, code: i32 },

    #[error(
        "Window {window} is not the foreground window ({foreground}); input to background windows is not supported"
    )]
    Unsupported {
        window: WindowHandle,
        foreground: WindowHandle,
    },

    #[error("No foreground window reported after {attempts} attempts")]
    NoForegroundWindow { attempts: u32 },

    #[error("Injection thread failed: {message}")]
    InjectionThread { message: String },

    #[error("Cursor at {actual} after move, expected {expected}")]
    CursorMismatch {
        expected: ScreenPoint,
        actual: ScreenPoint,
    },

    #[error("Platform error: {0}")]
    Platform(PlatformError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Idle(#[from] IdleError),
}

impl From<PlatformError> for DispatchError {
    fn from(error: PlatformError) -> Self {
        match error {
            PlatformError::NativeCall { call, code } => DispatchError::NativeCall { call, code },
            other => DispatchError::Platform(other),
        }
    }
}

impl DriveError for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            DispatchError::InvalidArgument { .. } => "DISPATCH_INVALID_ARGUMENT",
            DispatchError::FocusRejected { .. } => "DISPATCH_FOCUS_REJECTED",
            DispatchError::NativeCall { .. } => "DISPATCH_NATIVE_CALL_FAILED",
            DispatchError::Unsupported { .. } => "DISPATCH_UNSUPPORTED",
            DispatchError::NoForegroundWindow { .. } => "DISPATCH_NO_FOREGROUND_WINDOW",
            DispatchError::InjectionThread { .. } => "DISPATCH_INJECTION_THREAD_FAILED",
            DispatchError::CursorMismatch { .. } => "DISPATCH_CURSOR_MISMATCH",
            DispatchError::Platform(e) => e.error_code(),
            DispatchError::Geometry(e) => e.error_code(),
            DispatchError::Idle(e) => e.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            DispatchError::InvalidArgument { .. } | DispatchError::Unsupported { .. } => true,
            DispatchError::Platform(e) => e.is_user_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_platform_error_maps_to_native_call() {
        let error: DispatchError = PlatformError::NativeCall {
            call: "SendInput",
            code: 5,
        }
        .into();
        assert!(matches!(
            error,
            DispatchError::NativeCall {
                call: "SendInput",
                code: 5
            }
        ));
        assert_eq!(error.error_code(), "DISPATCH_NATIVE_CALL_FAILED");
    }

    #[test]
    fn test_other_platform_errors_keep_their_code() {
        let error: DispatchError = PlatformError::InputBlocked {
            inserted: 0,
            requested: 2,
        }
        .into();
        assert_eq!(error.error_code(), "PLATFORM_INPUT_BLOCKED");
    }

    #[test]
    fn test_unsupported_display() {
        let error = DispatchError::Unsupported {
            window: WindowHandle(0x10),
            foreground: WindowHandle(0x20),
        };
        let message = error.to_string();
        assert!(message.contains("0x10"));
        assert!(message.contains("0x20"));
        assert!(error.is_user_error());
    }

    #[test]
    fn test_cursor_mismatch_display() {
        let error = DispatchError::CursorMismatch {
            expected: ScreenPoint::new(10, 10),
            actual: ScreenPoint::new(9, 10),
        };
        assert_eq!(error.to_string(), "Cursor at (9, 10) after move, expected (10, 10)");
        assert_eq!(error.error_code(), "DISPATCH_CURSOR_MISMATCH");
    }

    #[test]
    fn test_idle_error_wraps() {
        let error: DispatchError = IdleError::LoopClosed.into();
        assert_eq!(error.error_code(), "IDLE_LOOP_CLOSED");
    }
}
