//! Citizen patient lookup against PDS, answered with redacted records

use std::sync::Arc;

use chrono::NaiveDate;
use database_layer::{AuditEvent, AuditLevel, AuditType};
use error_common::FieldErrors;
use pds_service::{PatientSearchCriteria, PdsBroker};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use super::{ServiceContext, ServiceError, ServiceResult};
use crate::redaction::{RedactedPatient, Redactor};
use crate::validation::{check_nhs_number, normalise_nhs_number, require_text, RequestValidation};

const CITIZEN: &str = "citizen";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NhsNumberSearchRequest {
    pub nhs_number: String,
}

impl RequestValidation for NhsNumberSearchRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_nhs_number(&mut errors, "nhs_number", &normalise_nhs_number(&self.nhs_number));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DetailsSearchRequest {
    pub surname: String,
    #[serde(default)]
    pub given_name: Option<String>,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub post_code: Option<String>,
}

impl RequestValidation for DetailsSearchRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "surname", &self.surname);
        errors.into_result()
    }
}

#[derive(Clone)]
pub struct PatientSearchService {
    ctx: ServiceContext,
    pds: Arc<dyn PdsBroker>,
    redactor: Redactor,
}

impl PatientSearchService {
    pub fn new(ctx: ServiceContext, pds: Arc<dyn PdsBroker>) -> Self {
        Self {
            ctx,
            pds,
            redactor: Redactor::new(),
        }
    }

    /// # Errors
    ///
    /// An invalid NHS number, no PDS record, or a PDS failure.
    pub async fn search_by_nhs_number(
        &self,
        request: NhsNumberSearchRequest,
    ) -> ServiceResult<RedactedPatient> {
        request.validate()?;
        let nhs_number = normalise_nhs_number(&request.nhs_number);

        let patient = self.pds.get_patient(&nhs_number).await?;
        self.record_search("NHS number", patient.is_some()).await;

        let patient = patient.ok_or_else(|| ServiceError::not_found("Patient", "NHS number"))?;
        Ok(self.redactor.redact(patient))
    }

    /// Exactly one PDS match is returned; more than one is
    /// [`ServiceError::AmbiguousMatch`].
    ///
    /// # Errors
    ///
    /// Missing surname, no match, several matches, or a PDS failure.
    pub async fn search_by_details(
        &self,
        request: DetailsSearchRequest,
    ) -> ServiceResult<RedactedPatient> {
        request.validate()?;
        let today = self.ctx.clock.now().date_naive();
        if request.date_of_birth > today {
            return Err(FieldErrors::single("date_of_birth", "Date of birth is in the future").into());
        }

        let criteria = PatientSearchCriteria {
            surname: request.surname.trim().to_string(),
            given_name: request.given_name.filter(|g| !g.trim().is_empty()),
            date_of_birth: request.date_of_birth,
            post_code: request.post_code.filter(|p| !p.trim().is_empty()),
        };
        let mut matches = self.pds.search_patients(&criteria).await?;
        info!(matches = matches.len(), "PDS demographic search completed");
        self.record_search("demographics", matches.len() == 1).await;

        match matches.len() {
            0 => Err(ServiceError::not_found("Patient", "demographic details")),
            1 => matches
                .pop()
                .map(|patient| self.redactor.redact(patient))
                .ok_or_else(|| ServiceError::not_found("Patient", "demographic details")),
            _ => Err(ServiceError::AmbiguousMatch),
        }
    }

    async fn record_search(&self, by: &str, found: bool) {
        let (level, outcome) = if found {
            (AuditLevel::Information, "matched a patient")
        } else {
            (AuditLevel::Warning, "did not match a single patient")
        };
        self.ctx
            .audit
            .log_event(
                AuditEvent::new(
                    AuditType::PatientSearch,
                    "Patient search",
                    format!("Search by {by} {outcome}"),
                )
                .with_level(level)
                .with_actor(CITIZEN),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use database_layer::{AuditLogger, MemoryStorage};
    use pds_service::{FakePdsBroker, MockPdsBroker, PdsError, PdsPatient};

    fn pds_patient(nhs_number: &str, given_name: &str) -> PdsPatient {
        PdsPatient {
            nhs_number: nhs_number.to_string(),
            title: None,
            given_name: given_name.to_string(),
            surname: "Smith".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 2).unwrap(),
            gender: None,
            email: Some("jane.smith@example.com".to_string()),
            phone: None,
            address: None,
            post_code: Some("LS1 4AP".to_string()),
        }
    }

    fn service(pds: Arc<dyn PdsBroker>) -> PatientSearchService {
        let storage = MemoryStorage::new();
        let ctx = ServiceContext::new(
            Arc::new(storage.clone()),
            AuditLogger::new(Arc::new(storage)),
            Arc::new(SystemClock),
        );
        PatientSearchService::new(ctx, pds)
    }

    fn details(given_name: Option<&str>) -> DetailsSearchRequest {
        DetailsSearchRequest {
            surname: "smith".to_string(),
            given_name: given_name.map(str::to_string),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 2).unwrap(),
            post_code: None,
        }
    }

    #[tokio::test]
    async fn test_nhs_number_search_returns_redacted_record() {
        let pds = FakePdsBroker::new(vec![pds_patient("9434765919", "Jane")]);
        let service = service(Arc::new(pds));

        let found = service
            .search_by_nhs_number(NhsNumberSearchRequest {
                nhs_number: "943 476 5919".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(found.given_name, "J***");
        assert_eq!(found.email.as_deref(), Some("j***.s****@example.com"));
        assert_eq!(found.post_code.as_deref(), Some("LS1 4**"));
    }

    #[tokio::test]
    async fn test_invalid_nhs_number_never_reaches_pds() {
        let mut pds = MockPdsBroker::new();
        pds.expect_get_patient().never();
        let service = service(Arc::new(pds));

        let result = service
            .search_by_nhs_number(NhsNumberSearchRequest {
                nhs_number: "9434765918".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_details_search_outcomes() {
        let pds = FakePdsBroker::new(vec![
            pds_patient("9434765919", "Jane"),
            pds_patient("9000000009", "John"),
        ]);
        let service = service(Arc::new(pds));

        let single = service.search_by_details(details(Some("jane"))).await.unwrap();
        assert_eq!(single.nhs_number, "9434765919");

        assert!(matches!(
            service.search_by_details(details(None)).await,
            Err(ServiceError::AmbiguousMatch)
        ));
        assert!(matches!(
            service.search_by_details(details(Some("Bob"))).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_pds_outage_is_a_dependency_error() {
        let mut pds = MockPdsBroker::new();
        pds.expect_get_patient()
            .returning(|_| Err(PdsError::Unavailable("timed out".to_string())));
        let service = service(Arc::new(pds));

        let result = service
            .search_by_nhs_number(NhsNumberSearchRequest {
                nhs_number: "9434765919".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Dependency(_))));
    }
}
