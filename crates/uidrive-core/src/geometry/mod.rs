pub mod errors;
pub mod operations;
pub mod types;

pub use errors::GeometryError;
pub use operations::{denormalize_point, normalize_axis, normalize_point};
pub use types::{NORMALIZED_MAX, NormalizedPoint, Rect, ScreenPoint, ScreenSize};
