use crate::errors::DriveError;

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("Invalid screen resolution {width}x{height}")]
    InvalidResolution { width: i32, height: i32 },
}

impl DriveError for GeometryError {
    fn error_code(&self) -> &'static str {
        match self {
            GeometryError::InvalidResolution { .. } => "GEOMETRY_INVALID_RESOLUTION",
        }
    }
}
