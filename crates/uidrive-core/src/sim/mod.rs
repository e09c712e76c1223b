//! Simulated desktop for running UI drivers without a real window system.
//!
//! `SimDesktop` stands in for the OS, `UiThread` for the toolkit's message
//! loop and `Toolkit` for its forms. `TestHarness` wires them to a
//! dispatcher and an idle barrier.

pub mod desktop;
pub mod errors;
pub mod harness;
pub mod message_loop;
pub mod toolkit;

pub use desktop::{InputSink, NullSink, RecordingSink, SimDesktop, WindowEvent};
pub use errors::SimError;
pub use harness::{ControlSpec, DEFAULT_SCREEN, FormRun, FormSession, TestHarness};
pub use message_loop::{UiHandle, UiThread};
pub use toolkit::{ControlId, DialogResult, FormHandle, Toolkit};
