//! Validation-code lifecycle
//!
//! A patient's code state is derived from the stored fields and the current
//! time:
//!
//! ```text
//! NoCode ──issue──▶ Issued ──verify──▶ Verified ──consume──▶ NoCode
//!                     │
//!                     ├── now > expires_on ──────▶ Expired
//!                     └── retry_count ≥ max ─────▶ RetriesExhausted
//! ```
//!
//! Issuing a new code from any state resets the expiry and the retry
//! counter.

use chrono::{DateTime, Duration, Utc};
use config_engine::{CodeAlphabet, ValidationCodeSettings};
use database_layer::Patient;
use rand::seq::SliceRandom;
use thiserror::Error;

const NUMERIC: &[u8] = b"0123456789";
/// Upper-case letters and digits without 0, O, 1 and I
const ALPHANUMERIC: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeState {
    NoCode,
    Issued,
    Verified,
    Expired,
    RetriesExhausted,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("No validation code has been issued")]
    NoCodeIssued,

    #[error("The validation code has already been verified")]
    AlreadyVerified,

    #[error("Too many incorrect attempts; request a new code")]
    RetriesExhausted,

    #[error("The validation code has expired; request a new code")]
    Expired,

    #[error("The validation code is incorrect ({remaining_attempts} attempts remaining)")]
    InvalidCode { remaining_attempts: i32 },

    #[error("Identity has not been verified")]
    NotVerified,

    #[error("A validation code was already issued and is valid until {expires_on}")]
    CodeAlreadyIssued { expires_on: DateTime<Utc> },
}

#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    alphabet: &'static [u8],
}

impl CodeGenerator {
    pub fn new(length: usize, alphabet: CodeAlphabet) -> Self {
        let alphabet = match alphabet {
            CodeAlphabet::Numeric => NUMERIC,
            CodeAlphabet::Alphanumeric => ALPHANUMERIC,
        };
        Self { length, alphabet }
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .filter_map(|_| self.alphabet.choose(&mut rng))
            .map(|&b| char::from(b))
            .collect()
    }
}

/// Issues and checks codes against a patient record. Callers persist the
/// patient after every call that mutates it.
#[derive(Debug, Clone)]
pub struct ValidationCodes {
    generator: CodeGenerator,
    expire_after: Duration,
    max_retry_count: i32,
}

impl ValidationCodes {
    pub fn new(settings: &ValidationCodeSettings) -> Self {
        Self {
            generator: CodeGenerator::new(settings.code_length, settings.alphabet),
            expire_after: Duration::minutes(settings.expire_after_minutes),
            max_retry_count: settings.max_retry_count,
        }
    }

    pub fn max_retry_count(&self) -> i32 {
        self.max_retry_count
    }

    pub fn state(&self, patient: &Patient, now: DateTime<Utc>) -> CodeState {
        if patient.validation_code.is_none() {
            return CodeState::NoCode;
        }
        if patient.validation_code_matched_on.is_some() {
            return CodeState::Verified;
        }
        if patient.retry_count >= self.max_retry_count {
            return CodeState::RetriesExhausted;
        }
        match patient.validation_code_expires_on {
            Some(expires_on) if now <= expires_on => CodeState::Issued,
            _ => CodeState::Expired,
        }
    }

    /// Put a fresh code on the patient and return it.
    pub fn issue(&self, patient: &mut Patient, now: DateTime<Utc>) -> String {
        let code = self.generator.generate();
        patient.validation_code = Some(code.clone());
        patient.validation_code_expires_on = Some(now + self.expire_after);
        patient.validation_code_matched_on = None;
        patient.retry_count = 0;
        code
    }

    /// Check `submitted` against the stored code.
    ///
    /// On a mismatch the retry counter is incremented before the error is
    /// returned; on a match `validation_code_matched_on` is set. Every other
    /// outcome leaves the patient untouched.
    ///
    /// # Errors
    ///
    /// The first failing check, in this order: no code, already verified,
    /// retries exhausted, expired, wrong code.
    pub fn verify(
        &self,
        patient: &mut Patient,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        self.check_open(patient, now)?;
        let Some(stored) = patient.validation_code.as_deref() else {
            return Err(VerificationError::NoCodeIssued);
        };

        if !submitted.trim().eq_ignore_ascii_case(stored) {
            patient.retry_count += 1;
            return Err(VerificationError::InvalidCode {
                remaining_attempts: self.max_retry_count - patient.retry_count,
            });
        }

        patient.validation_code_matched_on = Some(now);
        Ok(())
    }

    /// Whether the patient's code can still be tried at `now`.
    ///
    /// # Errors
    ///
    /// No code, already verified, retries exhausted or expired, checked in
    /// that order.
    pub fn check_open(&self, patient: &Patient, now: DateTime<Utc>) -> Result<(), VerificationError> {
        if patient.validation_code.is_none() {
            return Err(VerificationError::NoCodeIssued);
        }
        if patient.validation_code_matched_on.is_some() {
            return Err(VerificationError::AlreadyVerified);
        }
        if patient.retry_count >= self.max_retry_count {
            return Err(VerificationError::RetriesExhausted);
        }
        let live = patient
            .validation_code_expires_on
            .is_some_and(|expires_on| now <= expires_on);
        if !live {
            return Err(VerificationError::Expired);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`VerificationError::NotVerified`] unless the patient's code was
    /// matched.
    pub fn require_verified(&self, patient: &Patient, now: DateTime<Utc>) -> Result<(), VerificationError> {
        match self.state(patient, now) {
            CodeState::Verified => Ok(()),
            _ => Err(VerificationError::NotVerified),
        }
    }

    /// Use up a verification, returning the patient to `NoCode`.
    pub fn consume(&self, patient: &mut Patient) {
        patient.validation_code = None;
        patient.validation_code_expires_on = None;
        patient.validation_code_matched_on = None;
        patient.retry_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use database_layer::NotificationPreference;
    use uuid::Uuid;

    fn codes() -> ValidationCodes {
        ValidationCodes::new(&ValidationCodeSettings::default())
    }

    fn patient() -> Patient {
        let now = Utc::now();
        Patient {
            id: Uuid::new_v4(),
            nhs_number: "9434765919".to_string(),
            title: None,
            given_name: "Jane".to_string(),
            surname: "Smith".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 2).unwrap(),
            gender: None,
            email: Some("jane@example.com".to_string()),
            phone: None,
            address: None,
            post_code: None,
            validation_code: None,
            validation_code_expires_on: None,
            validation_code_matched_on: None,
            retry_count: 0,
            notification_preference: NotificationPreference::Email,
            created_by: "test".to_string(),
            created_date: now,
            updated_by: "test".to_string(),
            updated_date: now,
        }
    }

    #[test]
    fn test_generated_codes_use_the_configured_alphabet() {
        let generator = CodeGenerator::new(5, CodeAlphabet::Alphanumeric);
        for _ in 0..200 {
            let code = generator.generate();
            assert_eq!(code.len(), 5);
            assert!(code.bytes().all(|b| ALPHANUMERIC.contains(&b)));
            assert!(!code.contains(['0', 'O', '1', 'I']));
        }

        let numeric = CodeGenerator::new(8, CodeAlphabet::Numeric).generate();
        assert_eq!(numeric.len(), 8);
        assert!(numeric.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_issue_resets_state() {
        let codes = codes();
        let now = Utc::now();
        let mut patient = patient();
        patient.retry_count = 3;
        patient.validation_code_matched_on = Some(now);

        let code = codes.issue(&mut patient, now);
        assert_eq!(patient.validation_code.as_deref(), Some(code.as_str()));
        assert_eq!(patient.retry_count, 0);
        assert_eq!(patient.validation_code_matched_on, None);
        assert_eq!(patient.validation_code_expires_on, Some(now + Duration::minutes(1440)));
        assert_eq!(codes.state(&patient, now), CodeState::Issued);
    }

    #[test]
    fn test_valid_code_verifies_exactly_once() {
        let codes = codes();
        let now = Utc::now();
        let mut patient = patient();
        let code = codes.issue(&mut patient, now);

        let submitted = format!("  {}  ", code.to_lowercase());
        assert_eq!(codes.verify(&mut patient, &submitted, now), Ok(()));
        assert_eq!(patient.validation_code_matched_on, Some(now));
        assert_eq!(codes.state(&patient, now), CodeState::Verified);

        assert_eq!(
            codes.verify(&mut patient, &code, now),
            Err(VerificationError::AlreadyVerified)
        );
    }

    #[test]
    fn test_retry_counter_is_monotonic_and_bounded() {
        let codes = codes();
        let now = Utc::now();
        let mut patient = patient();
        let code = codes.issue(&mut patient, now);

        for expected in 1..=3 {
            let result = codes.verify(&mut patient, "WRONG", now);
            assert_eq!(
                result,
                Err(VerificationError::InvalidCode {
                    remaining_attempts: 3 - expected
                })
            );
            assert_eq!(patient.retry_count, expected);
        }

        assert_eq!(
            codes.verify(&mut patient, "WRONG", now),
            Err(VerificationError::RetriesExhausted)
        );
        assert_eq!(
            codes.verify(&mut patient, &code, now),
            Err(VerificationError::RetriesExhausted)
        );
        assert_eq!(patient.retry_count, 3);
        assert_eq!(codes.state(&patient, now), CodeState::RetriesExhausted);
    }

    #[test]
    fn test_expired_code_does_not_count_as_retry() {
        let codes = codes();
        let now = Utc::now();
        let mut patient = patient();
        let code = codes.issue(&mut patient, now);

        let later = now + Duration::minutes(1441);
        assert_eq!(
            codes.verify(&mut patient, &code, later),
            Err(VerificationError::Expired)
        );
        assert_eq!(patient.retry_count, 0);
        assert_eq!(codes.state(&patient, later), CodeState::Expired);

        // Exactly at the expiry instant the code is still good
        let at_expiry = now + Duration::minutes(1440);
        assert_eq!(codes.verify(&mut patient, &code, at_expiry), Ok(()));
    }

    #[test]
    fn test_no_code_and_consume() {
        let codes = codes();
        let now = Utc::now();
        let mut patient = patient();
        assert_eq!(
            codes.verify(&mut patient, "ABCDE", now),
            Err(VerificationError::NoCodeIssued)
        );
        assert_eq!(
            codes.require_verified(&patient, now),
            Err(VerificationError::NotVerified)
        );

        let code = codes.issue(&mut patient, now);
        assert_eq!(
            codes.require_verified(&patient, now),
            Err(VerificationError::NotVerified)
        );
        codes.verify(&mut patient, &code, now).unwrap();
        assert_eq!(codes.require_verified(&patient, now), Ok(()));

        codes.consume(&mut patient);
        assert_eq!(codes.state(&patient, now), CodeState::NoCode);
        assert_eq!(patient.validation_code, None);
    }
}
