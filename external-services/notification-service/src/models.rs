use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Sms,
    Letter,
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
            NotificationChannel::Letter => "letter",
        })
    }
}

/// A validation code on its way to a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeNotification {
    pub channel: NotificationChannel,
    pub given_name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Comma-separated address lines, without the postcode
    pub address: Option<String>,
    pub post_code: Option<String>,
    pub validation_code: String,
    pub expires_on: DateTime<Utc>,
}

impl CodeNotification {
    pub fn email_address(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Postal lines: full name, each address line, then the postcode.
    pub fn postal_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{} {}", self.given_name, self.surname)
            .trim()
            .to_string()];
        if let Some(address) = &self.address {
            lines.extend(
                address
                    .split(',')
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }
        if let Some(post_code) = self.post_code.as_deref().filter(|p| !p.trim().is_empty()) {
            lines.push(post_code.trim().to_string());
        }
        lines
    }
}

/// Provider acknowledgement of a sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: String,
    pub channel: NotificationChannel,
    pub provider: &'static str,
}
