use crate::errors::DriveError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdleError {
    #[error("UI message loop closed while waiting for idle")]
    LoopClosed,
}

impl DriveError for IdleError {
    fn error_code(&self) -> &'static str {
        match self {
            IdleError::LoopClosed => "IDLE_LOOP_CLOSED",
        }
    }
}
