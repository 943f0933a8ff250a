use async_trait::async_trait;

use crate::error::NotifyError;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Pluggable delivery channel for outage notifications.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable recipient list, used in the journal.
    fn recipients(&self) -> Vec<String>;

    /// False for backends that drop everything.
    fn is_enabled(&self) -> bool {
        true
    }
}
