//! Logging with automatic PII redaction
//!
//! Patient-facing flows handle NHS numbers, email addresses, phone numbers
//! and postcodes. Any of them can end up in a log line through an error
//! message or a debug field, so every formatted line passes through a
//! [`PiiRedactor`] before it reaches stdout.
//!
//! # Detected Data Types
//!
//! - **NHS numbers**: `943 476 5919` → `NHS[<hash>]`
//! - **Email addresses**: `john.doe@example.com` → `EMAIL[<hash>]` or `j***@e***`
//! - **UK phone numbers**: `07700 900123` → `PHONE[<hash>]` or `*** **** ****`
//! - **UK postcodes**: `SW1A 1AA` → `POSTCODE[<hash>]` or `SW1A ***`
//! - **Custom patterns**: configurable regex replacements
//!
//! Hashes are a truncated SHA-256 of the normalised value so the same patient
//! can be followed across log lines without exposing the identifier.
//!
//! # Example
//!
//! ```rust,no_run
//! use logger_redacted::{init_tracing, LoggerConfig};
//!
//! init_tracing(&LoggerConfig::default()).expect("tracing initialised once");
//! tracing::info!("Validation code sent to john.doe@example.com");
//! // Output: "Validation code sent to EMAIL[Zt1c...]"
//! ```

pub mod config;
pub mod redactor;
pub mod writer;

pub use config::*;
pub use redactor::*;
pub use writer::*;

use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Tracing already initialised: {0}")]
    AlreadyInitialised(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
///
/// # Errors
///
/// Fails when the filter directives do not parse or a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directives())?,
    };

    let redactor = if config.redaction_enabled {
        PiiRedactor::new(RedactionConfig {
            hash_for_correlation: config.hash_for_correlation,
            ..Default::default()
        })
    } else {
        PiiRedactor::disabled()
    };
    let writer = RedactingMakeWriter::new(std::io::stdout, Arc::new(redactor));

    if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_writer(writer),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .try_init()?;
    }

    tracing::debug!(
        json = config.json,
        redaction_enabled = config.redaction_enabled,
        "Tracing initialised"
    );

    Ok(())
}
