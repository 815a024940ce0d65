use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

lazy_static! {
    // One alternation so each span of the input is matched, and replaced, once.
    // Earlier alternatives win at the same position: an email local part that
    // looks like a postcode is still treated as an email.
    static ref PII_REGEX: Regex = Regex::new(concat!(
        r"(?P<email>\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b)",
        r"|(?P<nhs>\b\d{3}[ -]?\d{3}[ -]?\d{4}\b)",
        r"|(?P<phone>(?:\+44\s?|\b0)\d{2,4}[\s-]?\d{3,4}[\s-]?\d{3,4}\b)",
        r"|(?P<postcode>\b(?i:[A-Z]{1,2}\d[A-Z\d]?\s?\d[A-Z]{2})\b)",
    ))
    .expect("PII pattern is a valid regex");
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_nhs_numbers: bool,
    pub redact_phones: bool,
    pub redact_postcodes: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_nhs_numbers: true,
            redact_phones: true,
            redact_postcodes: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl RedactionConfig {
    /// Add an organisation-specific pattern applied after the built-in ones.
    ///
    /// # Errors
    ///
    /// Returns the regex error when `pattern` does not compile.
    pub fn with_custom_pattern(
        mut self,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        self.custom_patterns
            .push((Regex::new(pattern)?, replacement.into()));
        Ok(self)
    }
}

/// PII redactor for log lines
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    /// A redactor that returns its input untouched.
    pub fn disabled() -> Self {
        Self::new(RedactionConfig {
            redact_emails: false,
            redact_nhs_numbers: false,
            redact_phones: false,
            redact_postcodes: false,
            hash_for_correlation: false,
            custom_patterns: Vec::new(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        let c = &self.config;
        c.redact_emails
            || c.redact_nhs_numbers
            || c.redact_phones
            || c.redact_postcodes
            || !c.custom_patterns.is_empty()
    }

    pub fn redact(&self, text: &str) -> String {
        if !self.is_enabled() {
            return text.to_string();
        }

        let mut result = PII_REGEX
            .replace_all(text, |caps: &Captures| self.replace_match(caps))
            .into_owned();

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).into_owned();
        }

        result
    }

    fn replace_match(&self, caps: &Captures) -> String {
        let whole = caps.get(0).map_or("", |m| m.as_str());

        if let Some(email) = caps.name("email") {
            return if self.config.redact_emails {
                self.redact_email(email.as_str())
            } else {
                whole.to_string()
            };
        }
        if let Some(nhs) = caps.name("nhs") {
            return if self.config.redact_nhs_numbers {
                self.masked("NHS", nhs.as_str(), "NHS[REDACTED]")
            } else {
                whole.to_string()
            };
        }
        if let Some(phone) = caps.name("phone") {
            return if self.config.redact_phones {
                self.masked("PHONE", phone.as_str(), "*** **** ****")
            } else {
                whole.to_string()
            };
        }
        if let Some(postcode) = caps.name("postcode") {
            return if self.config.redact_postcodes {
                self.redact_postcode(postcode.as_str())
            } else {
                whole.to_string()
            };
        }

        whole.to_string()
    }

    fn redact_email(&self, email: &str) -> String {
        if self.config.hash_for_correlation {
            return format!("EMAIL[{}]", self.hash_value(email));
        }
        match email.split_once('@') {
            Some((local, domain)) => format!(
                "{}***@{}***",
                local.chars().next().unwrap_or('*'),
                domain.chars().next().unwrap_or('*')
            ),
            None => "***@***".to_string(),
        }
    }

    fn redact_postcode(&self, postcode: &str) -> String {
        if self.config.hash_for_correlation {
            return format!("POSTCODE[{}]", self.hash_value(postcode));
        }
        // Keep the outward code, it only identifies a district.
        match postcode.split_once(' ') {
            Some((outward, _)) => format!("{outward} ***"),
            None => "*** ***".to_string(),
        }
    }

    fn masked(&self, label: &str, value: &str, mask: &str) -> String {
        if self.config.hash_for_correlation {
            format!("{label}[{}]", self.hash_value(value))
        } else {
            mask.to_string()
        }
    }

    fn hash_value(&self, value: &str) -> String {
        let normalised: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        let mut hasher = Sha256::new();
        hasher.update(normalised.to_lowercase().as_bytes());
        let result = hasher.finalize();
        general_purpose::URL_SAFE_NO_PAD.encode(result.get(..8).unwrap_or_default())
    }
}
