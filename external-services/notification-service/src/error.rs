use thiserror::Error;

use crate::models::NotificationChannel;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("{provider} cannot deliver by {channel}")]
    UnsupportedChannel {
        provider: &'static str,
        channel: NotificationChannel,
    },

    #[error("Recipient has no {0} on record")]
    MissingRecipient(&'static str),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Provider configuration invalid: {0}")]
    Configuration(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for NotificationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            NotificationError::Unavailable(error.to_string())
        } else {
            NotificationError::SendFailed(error.to_string())
        }
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(error: handlebars::RenderError) -> Self {
        NotificationError::Template(error.to_string())
    }
}

impl From<handlebars::TemplateError> for NotificationError {
    fn from(error: handlebars::TemplateError) -> Self {
        NotificationError::Template(error.to_string())
    }
}

impl NotificationError {
    /// Whether the failure is on the provider side.
    pub fn is_unavailable(&self) -> bool {
        match self {
            NotificationError::Unavailable(_) => true,
            NotificationError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type NotificationResult<T> = Result<T, NotificationError>;
