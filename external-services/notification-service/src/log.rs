// Development broker: renders the message and logs it
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::broker::NotificationBroker;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{CodeNotification, Delivery, NotificationChannel};
use crate::templates::CodeTemplates;

pub struct LogNotificationBroker {
    templates: CodeTemplates,
}

impl LogNotificationBroker {
    pub fn new(templates: CodeTemplates) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl NotificationBroker for LogNotificationBroker {
    async fn send_code(&self, notification: &CodeNotification) -> NotificationResult<Delivery> {
        let recipient = match notification.channel {
            NotificationChannel::Email => notification
                .email_address()
                .ok_or(NotificationError::MissingRecipient("email address"))?
                .to_string(),
            NotificationChannel::Sms => notification
                .phone_number()
                .ok_or(NotificationError::MissingRecipient("phone number"))?
                .to_string(),
            NotificationChannel::Letter => notification.postal_lines().join(", "),
        };

        let rendered = self.templates.render(notification)?;
        let message_id = Uuid::new_v4().to_string();

        info!(
            provider = "log",
            channel = %notification.channel,
            recipient = %recipient,
            message_id = %message_id,
            body = %rendered.body,
            "Code notification (not sent)"
        );

        Ok(Delivery {
            message_id,
            channel: notification.channel,
            provider: self.provider_name(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_log_broker_acknowledges_every_channel() {
        let broker = LogNotificationBroker::new(CodeTemplates::new().unwrap());
        for channel in [
            NotificationChannel::Email,
            NotificationChannel::Sms,
            NotificationChannel::Letter,
        ] {
            let notification = CodeNotification {
                channel,
                given_name: "Jane".to_string(),
                surname: "Smith".to_string(),
                email: Some("jane@example.com".to_string()),
                phone: Some("07700900123".to_string()),
                address: Some("1 High Street".to_string()),
                post_code: Some("LS1 6AE".to_string()),
                validation_code: "K7QX2".to_string(),
                expires_on: Utc::now(),
            };
            let delivery = broker.send_code(&notification).await.unwrap();
            assert_eq!(delivery.channel, channel);
            assert_eq!(delivery.provider, "log");
        }
    }
}
