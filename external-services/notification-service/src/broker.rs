use async_trait::async_trait;

use crate::error::NotificationResult;
use crate::models::{CodeNotification, Delivery};

/// Delivers validation codes to patients.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait NotificationBroker: Send + Sync {
    async fn send_code(&self, notification: &CodeNotification) -> NotificationResult<Delivery>;

    fn provider_name(&self) -> &'static str;
}
