//! Validation-code delivery
//!
//! [`NotificationBroker`] implementations:
//!
//! - [`SmtpNotificationBroker`]: email through an SMTP relay (mail-send)
//! - [`NotifyNotificationBroker`]: email, SMS and letter through GOV.UK Notify
//! - [`LogNotificationBroker`]: logs the rendered message, for development
//!
//! Message bodies for SMTP and log delivery come from [`CodeTemplates`]
//! (handlebars). With the `mock` feature the crate also exports
//! `MockNotificationBroker`.

pub mod broker;
pub mod error;
pub mod log;
pub mod models;
pub mod notify;
pub mod smtp;
pub mod templates;

pub use broker::NotificationBroker;
#[cfg(any(test, feature = "mock"))]
pub use broker::MockNotificationBroker;
pub use error::{NotificationError, NotificationResult};
pub use log::LogNotificationBroker;
pub use models::{CodeNotification, Delivery, NotificationChannel};
pub use notify::{NotifyConfig, NotifyNotificationBroker};
pub use smtp::{SmtpConfig, SmtpNotificationBroker};
pub use templates::{CodeTemplates, RenderedMessage};
