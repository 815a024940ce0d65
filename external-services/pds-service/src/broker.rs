use async_trait::async_trait;

use crate::error::PdsResult;
use crate::models::{PatientSearchCriteria, PdsPatient};

/// Demographic lookups against PDS.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PdsBroker: Send + Sync {
    /// Fetch one patient by NHS number. `Ok(None)` when PDS has no record.
    async fn get_patient(&self, nhs_number: &str) -> PdsResult<Option<PdsPatient>>;

    /// Every patient matching the criteria.
    async fn search_patients(&self, criteria: &PatientSearchCriteria) -> PdsResult<Vec<PdsPatient>>;
}
