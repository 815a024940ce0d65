// Handlebars templates for the code message
use handlebars::Handlebars;
use serde::Serialize;

use crate::error::NotificationResult;
use crate::models::{CodeNotification, NotificationChannel};

const EMAIL_SUBJECT: &str = "Your data opt-out verification code";

const EMAIL_BODY: &str = "Dear {{given_name}},

Your verification code is: {{validation_code}}

Enter this code to continue managing your data sharing choices.
The code expires on {{expires_on}}.

If you did not ask for this code you can ignore this message.
";

const SMS_BODY: &str = "Your data opt-out verification code is {{validation_code}}. It expires on {{expires_on}}.";

const LETTER_BODY: &str = "Dear {{given_name}} {{surname}},

You asked for a verification code to manage your data sharing choices.

Your code is: {{validation_code}}

The code expires on {{expires_on}}.
";

#[derive(Serialize)]
struct CodeContext<'a> {
    given_name: &'a str,
    surname: &'a str,
    validation_code: &'a str,
    expires_on: String,
}

/// Rendered message ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Registry of the code message templates, one per channel.
pub struct CodeTemplates {
    registry: Handlebars<'static>,
}

impl CodeTemplates {
    /// Build the registry with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Template` if a template fails to parse.
    pub fn new() -> NotificationResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // plain text bodies, nothing to escape
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_template_string("email", EMAIL_BODY)?;
        registry.register_template_string("sms", SMS_BODY)?;
        registry.register_template_string("letter", LETTER_BODY)?;
        Ok(Self { registry })
    }

    /// Replace the body template for one channel.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Template` if the template fails to parse.
    pub fn with_template(mut self, channel: NotificationChannel, template: &str) -> NotificationResult<Self> {
        self.registry
            .register_template_string(&channel.to_string(), template)?;
        Ok(self)
    }

    /// Render the message for the notification's channel.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Template` on a rendering failure.
    pub fn render(&self, notification: &CodeNotification) -> NotificationResult<RenderedMessage> {
        let context = CodeContext {
            given_name: &notification.given_name,
            surname: &notification.surname,
            validation_code: &notification.validation_code,
            expires_on: notification
                .expires_on
                .format("%d %B %Y at %H:%M UTC")
                .to_string(),
        };
        let body = self
            .registry
            .render(&notification.channel.to_string(), &context)?;
        Ok(RenderedMessage {
            subject: EMAIL_SUBJECT.to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn notification(channel: NotificationChannel) -> CodeNotification {
        CodeNotification {
            channel,
            given_name: "Jane".to_string(),
            surname: "O'Neill".to_string(),
            email: Some("jane@example.com".to_string()),
            phone: None,
            address: None,
            post_code: None,
            validation_code: "K7QX2".to_string(),
            expires_on: Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_email_body_contains_code_and_expiry() {
        let templates = CodeTemplates::new().unwrap();
        let message = templates.render(&notification(NotificationChannel::Email)).unwrap();

        assert!(message.body.starts_with("Dear Jane,"));
        assert!(message.body.contains("K7QX2"));
        assert!(message.body.contains("04 March 2026 at 09:30 UTC"));
        assert_eq!(message.subject, EMAIL_SUBJECT);
    }

    #[test]
    fn test_names_are_not_html_escaped() {
        let templates = CodeTemplates::new().unwrap();
        let message = templates.render(&notification(NotificationChannel::Letter)).unwrap();
        assert!(message.body.contains("Jane O'Neill"));
    }

    #[test]
    fn test_custom_template_replaces_channel_body() {
        let templates = CodeTemplates::new()
            .unwrap()
            .with_template(NotificationChannel::Sms, "Code {{validation_code}}")
            .unwrap();
        let message = templates.render(&notification(NotificationChannel::Sms)).unwrap();
        assert_eq!(message.body, "Code K7QX2");
    }

    #[test]
    fn test_strict_mode_rejects_unknown_fields() {
        let templates = CodeTemplates::new()
            .unwrap()
            .with_template(NotificationChannel::Sms, "{{nhs_number}}")
            .unwrap();
        assert!(templates.render(&notification(NotificationChannel::Sms)).is_err());
    }
}
