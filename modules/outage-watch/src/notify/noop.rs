use async_trait::async_trait;

use super::backend::{Notification, NotifyBackend};
use crate::error::NotifyError;

/// Used when no SMTP host is configured.
pub struct NoopBackend;

#[async_trait]
impl NotifyBackend for NoopBackend {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::debug!(subject = %notification.subject, "Notifications disabled, dropping message");
        Ok(())
    }

    fn recipients(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
