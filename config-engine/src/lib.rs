//! Layered configuration for the opt-out service
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. An optional YAML or TOML file, chosen by extension
//! 3. Environment variables prefixed `OPTOUT_`, with `__` between section and
//!    key: `OPTOUT_DATABASE__URL`, `OPTOUT_VALIDATION_CODE__MAX_RETRY_COUNT`
//!
//! The merged result is validated before it is handed out.
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_file("optout.yaml")
//!     .load()
//!     .expect("valid configuration");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod error;
pub mod settings;
pub mod validation;

pub use error::*;
pub use settings::*;

use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV_PREFIX: &str = "OPTOUT_";

/// Builds an [`AppConfig`] from defaults, an optional file and the environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// The merged provider chain, before extraction.
    pub fn figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = &self.file {
            let is_toml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
            figment = if is_toml {
                figment.merge(Toml::file(path))
            } else {
                figment.merge(Yaml::file(path))
            };
        }

        figment.merge(Env::prefixed(&self.env_prefix).split("__"))
    }

    /// Extract and validate the configuration.
    ///
    /// # Errors
    ///
    /// Fails when the configured file is missing, a source does not parse
    /// into [`AppConfig`], or validation rejects the merged result.
    pub fn load(&self) -> Result<AppConfig> {
        if let Some(path) = &self.file {
            if !path.exists() {
                return Err(ConfigError::SourceNotFound(path.clone()));
            }
        }

        let config: AppConfig = self.figment().extract()?;
        config.validate()?;

        tracing::debug!(
            file = ?self.file,
            backend = ?config.database.backend,
            pds_mode = ?config.pds.mode,
            notification_provider = ?config.notification.provider,
            "Configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults_fail_without_secret() {
        Jail::expect_with(|_jail| {
            let result = ConfigLoader::new().load();
            assert!(matches!(result, Err(ConfigError::ValidationError(msg)) if msg.contains("jwt_secret")));
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "optout.yaml",
                r#"
server:
  port: 9000
database:
  backend: memory
validation_code:
  code_length: 6
  alphabet: numeric
"#,
            )?;
            jail.set_env("OPTOUT_AUTH__JWT_SECRET", SECRET);
            jail.set_env("OPTOUT_SERVER__PORT", "9090");
            jail.set_env("OPTOUT_VALIDATION_CODE__MAX_RETRY_COUNT", "5");

            let config = ConfigLoader::new()
                .with_file("optout.yaml")
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.server.port, 9090);
            assert_eq!(config.database.backend, StorageBackend::Memory);
            assert_eq!(config.validation_code.code_length, 6);
            assert_eq!(config.validation_code.alphabet, CodeAlphabet::Numeric);
            assert_eq!(config.validation_code.max_retry_count, 5);
            assert_eq!(config.validation_code.expire_after_minutes, 1440);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_is_supported() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "optout.toml",
                r#"
[notification]
provider = "smtp"

[notification.smtp]
host = "mail.internal"
port = 2525
"#,
            )?;
            jail.set_env("OPTOUT_AUTH__JWT_SECRET", SECRET);

            let config = ConfigLoader::new()
                .with_file("optout.toml")
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.notification.provider, NotificationProvider::Smtp);
            assert_eq!(config.notification.smtp.host, "mail.internal");
            assert_eq!(config.notification.smtp.port, 2525);
            Ok(())
        });
    }

    #[test]
    fn test_custom_env_prefix() {
        Jail::expect_with(|jail| {
            jail.set_env("OPTOUT_AUTH__JWT_SECRET", "too-short");
            jail.set_env("CONSENT_AUTH__JWT_SECRET", SECRET);
            jail.set_env("CONSENT_PDS__MODE", "fake");

            let config = ConfigLoader::new()
                .with_env_prefix("CONSENT_")
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.auth.jwt_secret, SECRET);
            assert_eq!(config.pds.mode, PdsMode::Fake);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_is_reported() {
        Jail::expect_with(|_jail| {
            let result = ConfigLoader::new().with_file("absent.yaml").load();
            assert!(matches!(result, Err(ConfigError::SourceNotFound(_))));
            Ok(())
        });
    }

    #[test]
    fn test_code_lifetime_is_bounded() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = SECRET.to_string();

        config.validation_code.expire_after_minutes = 7 * 24 * 60;
        assert!(config.validate().is_ok());

        for minutes in [0, 7 * 24 * 60 + 1, i64::MAX] {
            config.validation_code.expire_after_minutes = minutes;
            let Err(ConfigError::ValidationError(message)) = config.validate() else {
                panic!("expected {minutes} minutes to be rejected");
            };
            assert!(message.contains("expire_after_minutes"));
        }
    }

    #[test]
    fn test_validation_lists_every_problem() {
        let mut config = AppConfig::default();
        config.validation_code.code_length = 2;
        config.validation_code.max_retry_count = 0;
        config.notification.provider = NotificationProvider::Notify;

        let Err(ConfigError::ValidationError(message)) = config.validate() else {
            panic!("expected validation error");
        };
        assert!(message.contains("code_length"));
        assert!(message.contains("max_retry_count"));
        assert!(message.contains("jwt_secret"));
        assert!(message.contains("notify.api_key"));
    }
}
