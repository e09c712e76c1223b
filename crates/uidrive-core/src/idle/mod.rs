pub mod barrier;
pub mod errors;

pub use barrier::{IdleBarrier, wait_for_idle};
pub use errors::IdleError;
