// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default level for the service's own targets
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Pass every formatted line through the PII redactor
    pub redaction_enabled: bool,
    /// Replace detected values with a short hash instead of a fixed mask
    pub hash_for_correlation: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            redaction_enabled: true,
            hash_for_correlation: true,
        }
    }
}

impl LoggerConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub fn filter_directives(&self) -> String {
        format!(
            "{level},tower_http=info,sqlx=warn,hyper=info,reqwest=info",
            level = self.log_level
        )
    }
}
