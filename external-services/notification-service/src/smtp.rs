// Email delivery over SMTP
use async_trait::async_trait;
use mail_builder::MessageBuilder;
use mail_send::SmtpClientBuilder;
use tracing::debug;
use uuid::Uuid;

use crate::broker::NotificationBroker;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{CodeNotification, Delivery, NotificationChannel};
use crate::templates::CodeTemplates;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_email: String,
    pub from_name: String,
}

/// Sends codes by email only.
pub struct SmtpNotificationBroker {
    config: SmtpConfig,
    templates: CodeTemplates,
}

impl SmtpNotificationBroker {
    pub fn new(config: SmtpConfig, templates: CodeTemplates) -> Self {
        Self { config, templates }
    }
}

#[async_trait]
impl NotificationBroker for SmtpNotificationBroker {
    async fn send_code(&self, notification: &CodeNotification) -> NotificationResult<Delivery> {
        if notification.channel != NotificationChannel::Email {
            return Err(NotificationError::UnsupportedChannel {
                provider: self.provider_name(),
                channel: notification.channel,
            });
        }
        let to = notification
            .email_address()
            .ok_or(NotificationError::MissingRecipient("email address"))?;

        let rendered = self.templates.render(notification)?;
        let message_id = Uuid::new_v4().to_string();
        let message = MessageBuilder::new()
            .from((self.config.from_name.as_str(), self.config.from_email.as_str()))
            .to(to)
            .subject(rendered.subject.as_str())
            .text_body(rendered.body.as_str());

        let mut smtp_client =
            SmtpClientBuilder::new(self.config.host.as_str(), self.config.port)
                .implicit_tls(self.config.use_tls);

        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            smtp_client = smtp_client.credentials((user.as_str(), pass.as_str()));
        }

        let mut client = smtp_client
            .connect()
            .await
            .map_err(|e| NotificationError::Unavailable(format!("SMTP connection failed: {e}")))?;

        client
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("Failed to send email: {e}")))?;

        debug!(provider = "smtp", message_id = %message_id, "Code email sent");
        Ok(Delivery {
            message_id,
            channel: NotificationChannel::Email,
            provider: self.provider_name(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn broker() -> SmtpNotificationBroker {
        SmtpNotificationBroker::new(
            SmtpConfig {
                host: "localhost".to_string(),
                port: 2525,
                username: None,
                password: None,
                use_tls: false,
                from_email: "noreply@optout.local".to_string(),
                from_name: "Opt-Out".to_string(),
            },
            CodeTemplates::new().unwrap(),
        )
    }

    fn notification(channel: NotificationChannel, email: Option<&str>) -> CodeNotification {
        CodeNotification {
            channel,
            given_name: "Jane".to_string(),
            surname: "Smith".to_string(),
            email: email.map(str::to_string),
            phone: Some("07700900123".to_string()),
            address: None,
            post_code: None,
            validation_code: "K7QX2".to_string(),
            expires_on: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_rejects_non_email_channels() {
        let result = broker()
            .send_code(&notification(NotificationChannel::Sms, Some("jane@example.com")))
            .await;
        assert!(matches!(
            result,
            Err(NotificationError::UnsupportedChannel { channel: NotificationChannel::Sms, .. })
        ));
    }

    #[tokio::test]
    async fn test_requires_email_address() {
        let result = broker()
            .send_code(&notification(NotificationChannel::Email, Some("  ")))
            .await;
        assert!(matches!(result, Err(NotificationError::MissingRecipient(_))));
    }
}
