use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Demographic record as held by PDS. Contains unmasked PII.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdsPatient {
    pub nhs_number: String,
    #[serde(default)]
    pub title: Option<String>,
    pub given_name: String,
    pub surname: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub post_code: Option<String>,
}

/// Demographic search. Surname and date of birth are mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSearchCriteria {
    pub surname: String,
    pub given_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub post_code: Option<String>,
}

impl PatientSearchCriteria {
    /// True when `patient` satisfies every supplied field. Names compare
    /// case-insensitively, postcodes ignoring case and spaces.
    pub fn matches(&self, patient: &PdsPatient) -> bool {
        if !patient.surname.eq_ignore_ascii_case(self.surname.trim())
            || patient.date_of_birth != self.date_of_birth
        {
            return false;
        }
        if let Some(given) = self.given_name.as_deref().filter(|g| !g.trim().is_empty()) {
            if !patient.given_name.eq_ignore_ascii_case(given.trim()) {
                return false;
            }
        }
        if let Some(post_code) = self.post_code.as_deref().filter(|p| !p.trim().is_empty()) {
            let wanted = normalise_post_code(post_code);
            if patient.post_code.as_deref().map(normalise_post_code) != Some(wanted) {
                return false;
            }
        }
        true
    }
}

pub fn normalise_post_code(post_code: &str) -> String {
    post_code
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
