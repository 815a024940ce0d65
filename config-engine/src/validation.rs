// Cross-field checks run after all sources are merged.
use crate::error::{ConfigError, Result};
use crate::settings::{AppConfig, NotificationProvider, PdsMode, StorageBackend};

const MIN_JWT_SECRET_LEN: usize = 32;
/// One week
const MAX_CODE_LIFETIME_MINUTES: i64 = 7 * 24 * 60;

impl AppConfig {
    /// Reject configurations the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.server.port == 0 {
            problems.push("server.port must be non-zero".to_string());
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.trim().is_empty() {
            problems.push("database.url is required for the postgres backend".to_string());
        }
        if self.database.max_connections == 0 {
            problems.push("database.max_connections must be at least 1".to_string());
        }

        let code = &self.validation_code;
        if !(4..=12).contains(&code.code_length) {
            problems.push("validation_code.code_length must be between 4 and 12".to_string());
        }
        if !(1..=MAX_CODE_LIFETIME_MINUTES).contains(&code.expire_after_minutes) {
            problems.push(format!(
                "validation_code.expire_after_minutes must be between 1 and {MAX_CODE_LIFETIME_MINUTES}"
            ));
        }
        if code.max_retry_count <= 0 {
            problems.push("validation_code.max_retry_count must be positive".to_string());
        }

        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            problems.push(format!(
                "auth.jwt_secret must be at least {MIN_JWT_SECRET_LEN} bytes"
            ));
        }

        if self.pds.mode == PdsMode::Fhir && self.pds.base_url.trim().is_empty() {
            problems.push("pds.base_url is required in fhir mode".to_string());
        }

        match self.notification.provider {
            NotificationProvider::Smtp if self.notification.smtp.host.trim().is_empty() => {
                problems.push("notification.smtp.host is required for the smtp provider".to_string());
            }
            NotificationProvider::Notify if self.notification.notify.api_key.trim().is_empty() => {
                problems.push("notification.notify.api_key is required for the notify provider".to_string());
            }
            _ => {}
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError(problems.join("; ")))
        }
    }
}
