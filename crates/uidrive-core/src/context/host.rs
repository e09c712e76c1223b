use std::sync::Arc;

use super::errors::BridgeError;

/// Callback marshaled onto the UI thread
pub type UiCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handler invoked by the UI loop when a notification is raised
pub type NotificationHandler = Arc<dyn Fn() + Send + Sync + 'static>;

/// Loop notifications a driver can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    /// The UI queue has drained
    Idle,
    /// A nested modal message loop has returned
    ModalLoopExited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// The toolkit side of the bridge.
///
/// Owns the single UI thread and its message loop. Every method may be
/// called from any thread.
pub trait UiHost: Send + Sync {
    /// Queue a callback to run on the UI thread, after everything already queued.
    fn post(&self, callback: UiCallback) -> Result<(), BridgeError>;

    fn is_ui_thread(&self) -> bool;

    fn subscribe(&self, notification: Notification, handler: NotificationHandler)
    -> SubscriptionId;

    /// Remove a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Number of open top-level windows
    fn open_window_count(&self) -> usize;
}

/// Subscription released when dropped
pub struct Subscription {
    host: Arc<dyn UiHost>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn new(
        host: Arc<dyn UiHost>,
        notification: Notification,
        handler: NotificationHandler,
    ) -> Self {
        let id = host.subscribe(notification, handler);
        Self { host, id }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.host.unsubscribe(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
