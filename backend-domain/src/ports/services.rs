use async_trait::async_trait;

use crate::entities::{NotificationDeliveryRecord, OutboundNotification, RuntimeConfig};

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Fire-and-forget; failures are logged, never returned.
    fn spawn_notifications(&self, config: RuntimeConfig, notifications: Vec<OutboundNotification>);
    async fn check_notify_target(&self, config: &RuntimeConfig) -> anyhow::Result<()>;
    async fn list_deliveries(&self, limit: usize) -> Vec<NotificationDeliveryRecord>;
    async fn last_delivery(&self) -> Option<NotificationDeliveryRecord>;
}
