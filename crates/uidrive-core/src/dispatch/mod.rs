pub mod dispatcher;
pub mod errors;
pub mod foreground;
pub mod types;

pub use dispatcher::InputDispatcher;
pub use errors::DispatchError;
pub use foreground::ForegroundGuard;
pub use types::{DispatchReport, DispatchSettings};
