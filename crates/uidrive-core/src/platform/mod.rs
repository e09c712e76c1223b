pub mod errors;
pub mod registry;
pub mod traits;
pub mod types;
#[cfg(windows)]
pub mod win32;

pub use errors::PlatformError;
pub use registry::default_platform;
pub use traits::{InputBackend, Platform, WindowManager};
pub use types::WindowHandle;
