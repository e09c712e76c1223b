use crate::context::BridgeError;
use crate::dispatch::DispatchError;
use crate::errors::{ConfigError, DriveError};
use crate::idle::IdleError;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("{operation} must be called on the UI thread")]
    CrossThreadAccess { operation: &'static str },

    #[error("Unknown control id {id}")]
    UnknownControl { id: usize },

    #[error("Control {id} is not a {expected}")]
    WrongControlKind { id: usize, expected: &'static str },

    #[error("Form is closed")]
    FormClosed,

    #[error("Failed to start UI thread: {message}")]
    ThreadStart { message: String },

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Idle(#[from] IdleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DriveError for SimError {
    fn error_code(&self) -> &'static str {
        match self {
            SimError::CrossThreadAccess { .. } => "SIM_CROSS_THREAD_ACCESS",
            SimError::UnknownControl { .. } => "SIM_UNKNOWN_CONTROL",
            SimError::WrongControlKind { .. } => "SIM_WRONG_CONTROL_KIND",
            SimError::FormClosed => "SIM_FORM_CLOSED",
            SimError::ThreadStart { .. } => "SIM_THREAD_START_FAILED",
            SimError::Bridge(e) => e.error_code(),
            SimError::Dispatch(e) => e.error_code(),
            SimError::Idle(e) => e.error_code(),
            SimError::Config(e) => e.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            SimError::Dispatch(e) => e.is_user_error(),
            SimError::Config(e) => e.is_user_error(),
            SimError::ThreadStart { .. } | SimError::Bridge(_) | SimError::Idle(_) => false,
            _ => true,
        }
    }
}
