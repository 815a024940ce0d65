use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Broad classification of a failure.
///
/// Every layer maps its own error type onto one of these so the HTTP edge
/// can pick a status code without knowing where the error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    Verification,
    Dependency,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation_error",
            ErrorCategory::Authentication => "authentication_error",
            ErrorCategory::Authorization => "authorization_error",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Verification => "verification_error",
            ErrorCategory::Dependency => "dependency_error",
            ErrorCategory::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation problems collected before failing a request.
///
/// Validators keep going after the first problem so the caller sees every
/// bad field at once.
///
/// ```
/// use error_common::FieldErrors;
///
/// let mut errors = FieldErrors::new();
/// errors.require("surname", false, "Surname is required");
/// errors.require("given_name", true, "Given name is required");
/// assert_eq!(errors.len(), 1);
/// assert!(errors.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-field error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Record `message` against `field` unless `condition` holds.
    pub fn require(
        &mut self,
        field: impl Into<String>,
        condition: bool,
        message: impl Into<String>,
    ) -> &mut Self {
        if !condition {
            self.add(field, message);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with at least one problem.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    pub fn into_map(self) -> HashMap<String, Vec<String>> {
        self.errors.into_iter().collect()
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when at least one field failed.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_multiple_messages_per_field() {
        let mut errors = FieldErrors::new();
        errors
            .add("email", "Email is required")
            .add("email", "Email must contain @");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email").map(<[String]>::len), Some(2));
        assert_eq!(
            errors.to_string(),
            "email: Email is required; email: Email must contain @"
        );
    }

    #[test]
    fn test_empty_errors_are_ok() {
        let mut errors = FieldErrors::new();
        errors.require("nhs_number", true, "unused");
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let errors = FieldErrors::single("surname", "Surname is required");
        let json = serde_json::to_value(&errors).unwrap_or_default();
        assert_eq!(json, serde_json::json!({ "surname": ["Surname is required"] }));
    }

    #[test]
    fn test_category_strings() {
        assert_eq!(ErrorCategory::NotFound.as_str(), "not_found");
        assert_eq!(ErrorCategory::Verification.to_string(), "verification_error");
    }
}
