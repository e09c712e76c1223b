use crate::errors::DriveError;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Unknown key name: '{name}'")]
    UnknownKey { name: String },

    #[error("Unknown mouse button: '{name}'")]
    UnknownButton { name: String },
}

impl DriveError for InputError {
    fn error_code(&self) -> &'static str {
        match self {
            InputError::UnknownKey { .. } => "INPUT_UNKNOWN_KEY",
            InputError::UnknownButton { .. } => "INPUT_UNKNOWN_BUTTON",
        }
    }

    fn is_user_error(&self) -> bool {
        true
    }
}
