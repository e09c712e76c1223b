pub mod errors;
pub mod executor;
pub mod host;
pub mod task_context;
pub mod timer;

pub use errors::BridgeError;
pub use executor::TaskHandle;
pub use host::{
    Notification, NotificationHandler, Subscription, SubscriptionId, UiCallback, UiHost,
};
pub use task_context::{ContextMode, SwitchToUiThread, TaskContext};
pub use timer::{Delay, delay};
