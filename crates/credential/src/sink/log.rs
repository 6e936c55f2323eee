//! Notification sink that only logs

use async_trait::async_trait;
use tracing::info;

use super::NotificationSender;
use super::events::NotificationEvent;
use crate::core::SinkError;

/// Writes events to the log; used when no chat is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), SinkError> {
        info!(
            kind = event.kind(),
            credential_id = %event.credential_id(),
            message = %event.description(),
            "Rotation event"
        );
        Ok(())
    }
}
