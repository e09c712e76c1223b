use crate::errors::DriveError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("UI message loop has shut down")]
    LoopClosed,

    #[error("Continuation resumed off the UI thread after a switch to the UI thread")]
    InlineResumption,

    #[error("Task was dropped before completing")]
    TaskDropped,
}

impl DriveError for BridgeError {
    fn error_code(&self) -> &'static str {
        match self {
            BridgeError::LoopClosed => "BRIDGE_LOOP_CLOSED",
            BridgeError::InlineResumption => "BRIDGE_INLINE_RESUMPTION",
            BridgeError::TaskDropped => "BRIDGE_TASK_DROPPED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_codes() {
        assert_eq!(BridgeError::LoopClosed.error_code(), "BRIDGE_LOOP_CLOSED");
        assert_eq!(
            BridgeError::InlineResumption.error_code(),
            "BRIDGE_INLINE_RESUMPTION"
        );
        assert_eq!(BridgeError::TaskDropped.error_code(), "BRIDGE_TASK_DROPPED");
        assert!(!BridgeError::TaskDropped.is_user_error());
    }

    #[test]
    fn test_inline_resumption_display() {
        assert!(
            BridgeError::InlineResumption
                .to_string()
                .contains("off the UI thread")
        );
    }
}
