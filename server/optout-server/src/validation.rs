//! Request validation helpers
//!
//! Request types implement [`RequestValidation`] and report every bad field
//! at once through [`FieldErrors`].

use error_common::FieldErrors;
use uuid::Uuid;

/// Trait for validating request payloads
pub trait RequestValidation {
    /// # Errors
    ///
    /// Every field that failed, keyed by field name.
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Strip the spaces people type into NHS numbers ("943 476 5919").
pub fn normalise_nhs_number(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Ten digits whose last digit is the modulus-11 check digit of the first
/// nine (weights 10 down to 2).
pub fn is_valid_nhs_number(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if value.len() != 10 || digits.len() != 10 {
        return false;
    }
    let Some((&check_digit, body)) = digits.split_last() else {
        return false;
    };
    let sum: u32 = body
        .iter()
        .zip((2..=10).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    match 11 - (sum % 11) {
        11 => check_digit == 0,
        10 => false,
        expected => check_digit == expected,
    }
}

pub fn is_plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn require_text(errors: &mut FieldErrors, field: &str, value: &str) {
    errors.require(field, !value.trim().is_empty(), format!("{field} is required"));
}

pub fn require_id(errors: &mut FieldErrors, field: &str, value: Uuid) {
    errors.require(field, !value.is_nil(), format!("{field} must not be empty"));
}

pub fn check_nhs_number(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{field} is required"));
    } else if !is_valid_nhs_number(value) {
        errors.add(field, "NHS number must be 10 digits with a valid check digit");
    }
}

pub fn check_optional_email(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(email) = value.filter(|e| !e.is_empty()) {
        errors.require(field, is_plausible_email(email), "Email address is not valid");
    }
}

pub fn check_max_length(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if value.is_some_and(|v| v.chars().count() > max) {
        errors.add(field, format!("{field} must be at most {max} characters"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nhs_number_check_digit() {
        assert!(is_valid_nhs_number("9434765919"));
        assert!(is_valid_nhs_number("9000000009"));
        assert!(is_valid_nhs_number("4010232137"));

        assert!(!is_valid_nhs_number("9434765918"));
        assert!(!is_valid_nhs_number("943476591"));
        assert!(!is_valid_nhs_number("94347659190"));
        assert!(!is_valid_nhs_number("94347659a9"));
        assert!(!is_valid_nhs_number(""));
    }

    #[test]
    fn test_check_digit_edge_cases() {
        // Weighted sum 12 leaves remainder 1, so no check digit is possible
        for last in 0..=9 {
            assert!(!is_valid_nhs_number(&format!("100000001{last}")));
        }
        // Weighted sum 22 leaves remainder 0, so the check digit is 0
        assert!(is_valid_nhs_number("1000000060"));
    }

    #[test]
    fn test_normalise_nhs_number() {
        assert_eq!(normalise_nhs_number(" 943 476 5919 "), "9434765919");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_plausible_email("jane.smith@example.com"));
        assert!(!is_plausible_email("jane.smith"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("jane@example"));
        assert!(!is_plausible_email("jane @example.com"));
        assert!(!is_plausible_email("jane@@example.com"));
    }

    #[test]
    fn test_helpers_collect_errors() {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "surname", "  ");
        require_id(&mut errors, "patient_id", Uuid::nil());
        check_nhs_number(&mut errors, "nhs_number", "123");
        check_optional_email(&mut errors, "email", Some("nope"));
        check_optional_email(&mut errors, "contact_email", None);
        check_max_length(&mut errors, "title", Some("Lieutenant-Commander"), 10);

        assert_eq!(errors.len(), 5);
        assert!(!errors.contains("contact_email"));
    }
}
