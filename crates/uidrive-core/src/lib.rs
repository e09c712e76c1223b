//! uidrive-core: Input injection and idle synchronization for desktop UI tests
//!
//! This library drives real (or simulated) windows with synthesized mouse and
//! keyboard input and lets an async test driver wait until the UI thread has
//! processed it. It is used by the `uidrive` CLI and by UI test suites.
//!
//! # Main Entry Points
//!
//! - [`dispatch`] - Force a window into the foreground and inject input
//! - [`idle`] - Wait until the UI message loop has no pending work
//! - [`context`] - Run async drivers on the UI thread
//! - [`sim`] - Simulated desktop, message loop and forms for tests
//! - [`config`] - Calibration and focus configuration

pub mod config;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod geometry;
pub mod idle;
pub mod input;
pub mod logging;
pub mod platform;
pub mod sim;

// Re-export commonly used types at crate root for convenience
pub use config::DriveConfig;
pub use context::{BridgeError, TaskContext, TaskHandle, UiHost};
pub use dispatch::{DispatchError, DispatchReport, InputDispatcher};
pub use errors::DriveError;
pub use geometry::{NormalizedPoint, Rect, ScreenPoint, ScreenSize};
pub use idle::{IdleBarrier, IdleError, wait_for_idle};
pub use input::{Injector, InputAction, KeyInput, MouseButton, VirtualKey};
pub use platform::{Platform, PlatformError, WindowHandle, default_platform};

// Re-export logging initialization
pub use logging::init_logging;
