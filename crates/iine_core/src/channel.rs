use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::Result;

/// Body returned by the push endpoint after a delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryResult {
    pub status: u16,
    pub message: String,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver one formatted message
    async fn send(&self, message: &str) -> Result<DeliveryResult>;
}
