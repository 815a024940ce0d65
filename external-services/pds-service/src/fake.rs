// In-memory PDS for development and tests
use async_trait::async_trait;
use std::path::Path;

use crate::broker::PdsBroker;
use crate::error::{PdsError, PdsResult};
use crate::models::{PatientSearchCriteria, PdsPatient};

/// Serves a fixed list of patients.
#[derive(Debug, Clone, Default)]
pub struct FakePdsBroker {
    patients: Vec<PdsPatient>,
}

impl FakePdsBroker {
    pub fn new(patients: Vec<PdsPatient>) -> Self {
        Self { patients }
    }

    /// Load patients from a JSON array of [`PdsPatient`] records.
    ///
    /// # Errors
    ///
    /// Returns `PdsError::DataFile` if the file is unreadable or malformed.
    pub fn from_file(path: &Path) -> PdsResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PdsError::DataFile(format!("{}: {e}", path.display())))?;
        let patients: Vec<PdsPatient> = serde_json::from_str(&contents)
            .map_err(|e| PdsError::DataFile(format!("{}: {e}", path.display())))?;
        tracing::info!(count = patients.len(), "Loaded fake PDS patients");
        Ok(Self::new(patients))
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

#[async_trait]
impl PdsBroker for FakePdsBroker {
    async fn get_patient(&self, nhs_number: &str) -> PdsResult<Option<PdsPatient>> {
        Ok(self
            .patients
            .iter()
            .find(|p| p.nhs_number == nhs_number)
            .cloned())
    }

    async fn search_patients(&self, criteria: &PatientSearchCriteria) -> PdsResult<Vec<PdsPatient>> {
        Ok(self
            .patients
            .iter()
            .filter(|p| criteria.matches(p))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn patient(nhs_number: &str, given: &str, post_code: &str) -> PdsPatient {
        PdsPatient {
            nhs_number: nhs_number.to_string(),
            title: None,
            given_name: given.to_string(),
            surname: "Smith".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 17).unwrap(),
            gender: None,
            email: None,
            phone: None,
            address: None,
            post_code: Some(post_code.to_string()),
        }
    }

    fn criteria() -> PatientSearchCriteria {
        PatientSearchCriteria {
            surname: "smith".to_string(),
            given_name: None,
            date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 17).unwrap(),
            post_code: None,
        }
    }

    #[tokio::test]
    async fn test_get_patient_by_nhs_number() {
        let broker = FakePdsBroker::new(vec![patient("9434765919", "Jane", "LS1 6AE")]);
        assert!(broker.get_patient("9434765919").await.unwrap().is_some());
        assert!(broker.get_patient("9434765870").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_narrows_with_optional_fields() {
        let broker = FakePdsBroker::new(vec![
            patient("9434765919", "Jane", "LS1 6AE"),
            patient("9434765870", "John", "M1 1AA"),
        ]);

        assert_eq!(broker.search_patients(&criteria()).await.unwrap().len(), 2);

        let by_given = PatientSearchCriteria {
            given_name: Some("JANE".to_string()),
            ..criteria()
        };
        assert_eq!(broker.search_patients(&by_given).await.unwrap().len(), 1);

        let by_post_code = PatientSearchCriteria {
            post_code: Some("m11aa".to_string()),
            ..criteria()
        };
        let found = broker.search_patients(&by_post_code).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].given_name, "John");
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let result = FakePdsBroker::from_file(Path::new("/nonexistent/patients.json"));
        assert!(matches!(result, Err(PdsError::DataFile(_))));
    }
}
