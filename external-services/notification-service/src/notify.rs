//! GOV.UK Notify delivery.
//!
//! Notify holds the message templates; we send the template id and the
//! personalisation values. Requests are authenticated with a short-lived
//! HS256 token signed with the secret half of the API key.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::broker::NotificationBroker;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{CodeNotification, Delivery, NotificationChannel};

const UUID_LEN: usize = 36;
const MIN_LETTER_LINES: usize = 3;
const MAX_LETTER_LINES: usize = 7;

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub base_url: String,
    pub api_key: String,
    pub email_template_id: String,
    pub sms_template_id: String,
    pub letter_template_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyClaims {
    pub iss: String,
    pub iat: i64,
}

#[derive(Debug, Deserialize)]
struct NotifyResponse {
    id: String,
}

/// The two identifiers packed into a Notify API key:
/// `{key_name}-{service_id}-{secret_key}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ApiKey {
    service_id: String,
    secret_key: String,
}

impl ApiKey {
    fn parse(raw: &str) -> NotificationResult<Self> {
        let raw = raw.trim();
        let invalid = || NotificationError::Configuration("malformed Notify API key".to_string());

        let secret_start = raw.len().checked_sub(UUID_LEN).ok_or_else(invalid)?;
        let service_start = secret_start.checked_sub(UUID_LEN + 1).ok_or_else(invalid)?;
        let secret_key = raw.get(secret_start..).ok_or_else(invalid)?;
        let service_id = raw.get(service_start..secret_start - 1).ok_or_else(invalid)?;

        Uuid::parse_str(secret_key).map_err(|_| invalid())?;
        Uuid::parse_str(service_id).map_err(|_| invalid())?;

        Ok(Self {
            service_id: service_id.to_string(),
            secret_key: secret_key.to_string(),
        })
    }
}

pub struct NotifyNotificationBroker {
    client: reqwest::Client,
    config: NotifyConfig,
    api_key: ApiKey,
}

impl NotifyNotificationBroker {
    /// # Errors
    ///
    /// Returns `NotificationError::Configuration` when the API key is
    /// malformed or the HTTP client cannot be built.
    pub fn new(config: NotifyConfig, timeout: Duration) -> NotificationResult<Self> {
        let api_key = ApiKey::parse(&config.api_key)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: NotifyConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            api_key,
        })
    }

    fn bearer_token(&self) -> NotificationResult<String> {
        let claims = NotifyClaims {
            iss: self.api_key.service_id.clone(),
            iat: Utc::now().timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.api_key.secret_key.as_bytes()),
        )
        .map_err(|e| NotificationError::Configuration(format!("cannot sign Notify token: {e}")))
    }

    fn personalisation(notification: &CodeNotification) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("given_name".into(), json!(notification.given_name));
        values.insert("validation_code".into(), json!(notification.validation_code));
        values.insert(
            "expires_on".into(),
            json!(notification.expires_on.format("%d %B %Y at %H:%M UTC").to_string()),
        );
        values
    }

    fn request_for(&self, notification: &CodeNotification, reference: &str) -> NotificationResult<(&'static str, Value)> {
        let mut personalisation = Self::personalisation(notification);
        match notification.channel {
            NotificationChannel::Email => {
                let email = notification
                    .email_address()
                    .ok_or(NotificationError::MissingRecipient("email address"))?;
                Ok((
                    "email",
                    json!({
                        "email_address": email,
                        "template_id": self.config.email_template_id,
                        "personalisation": personalisation,
                        "reference": reference,
                    }),
                ))
            }
            NotificationChannel::Sms => {
                let phone = notification
                    .phone_number()
                    .ok_or(NotificationError::MissingRecipient("phone number"))?;
                Ok((
                    "sms",
                    json!({
                        "phone_number": phone,
                        "template_id": self.config.sms_template_id,
                        "personalisation": personalisation,
                        "reference": reference,
                    }),
                ))
            }
            NotificationChannel::Letter => {
                let lines = notification.postal_lines();
                if lines.len() < MIN_LETTER_LINES || notification.post_code.is_none() {
                    return Err(NotificationError::MissingRecipient("postal address"));
                }
                for (i, line) in lines.into_iter().take(MAX_LETTER_LINES).enumerate() {
                    personalisation.insert(format!("address_line_{}", i + 1), json!(line));
                }
                Ok((
                    "letter",
                    json!({
                        "template_id": self.config.letter_template_id,
                        "personalisation": personalisation,
                        "reference": reference,
                    }),
                ))
            }
        }
    }
}

#[async_trait]
impl NotificationBroker for NotifyNotificationBroker {
    async fn send_code(&self, notification: &CodeNotification) -> NotificationResult<Delivery> {
        let reference = Uuid::new_v4().to_string();
        let (kind, body) = self.request_for(notification, &reference)?;
        let url = format!("{}/v2/notifications/{kind}", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bearer_token()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, kind, "Notify rejected the notification");
            return Err(NotificationError::Rejected { status, body });
        }

        let sent: NotifyResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("Response parse error: {e}")))?;

        debug!(provider = "notify", kind, message_id = %sent.id, "Notification accepted");
        Ok(Delivery {
            message_id: sent.id,
            channel: notification.channel,
            provider: self.provider_name(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "notify"
    }
}
