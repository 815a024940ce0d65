//! Decisions recorded by citizens who have just verified a code

use database_layer::{AuditEvent, AuditType, Decision};
use error_common::FieldErrors;
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{PatientService, ResponsiblePerson, ServiceContext, ServiceResult};
use crate::validation::{check_max_length, check_nhs_number, normalise_nhs_number, require_id, RequestValidation};
use crate::validation_code::{ValidationCodes, VerificationError};

const CITIZEN: &str = "citizen";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifiedDecisionRequest {
    pub nhs_number: String,
    pub decision_type_id: Uuid,
    #[serde(default)]
    pub decision_choice: Option<String>,
    #[serde(default)]
    pub responsible_person: Option<ResponsiblePerson>,
}

impl RequestValidation for VerifiedDecisionRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_nhs_number(&mut errors, "nhs_number", &normalise_nhs_number(&self.nhs_number));
        require_id(&mut errors, "decision_type_id", self.decision_type_id);
        check_max_length(&mut errors, "decision_choice", self.decision_choice.as_deref(), 255);
        if let Some(person) = &self.responsible_person {
            person.check(&mut errors);
        }
        errors.into_result()
    }
}

#[derive(Clone)]
pub struct VerifiedDecisionService {
    ctx: ServiceContext,
    patients: PatientService,
    codes: ValidationCodes,
}

impl VerifiedDecisionService {
    pub fn new(ctx: ServiceContext, codes: ValidationCodes) -> Self {
        Self {
            patients: PatientService::new(ctx.clone()),
            ctx,
            codes,
        }
    }

    /// Record the decision and use up the verification, so the next
    /// decision needs a fresh code. Both happen in one storage write, which
    /// only succeeds while the match is still unused.
    ///
    /// # Errors
    ///
    /// - [`VerificationError::NotVerified`] unless the patient's code was
    ///   matched
    /// - validation: bad input or an unknown decision type
    /// - storage failures
    pub async fn record_decision(&self, request: VerifiedDecisionRequest) -> ServiceResult<Decision> {
        request.validate()?;
        let nhs_number = normalise_nhs_number(&request.nhs_number);
        let now = self.ctx.clock.now();

        let Some(patient) = self.patients.find_by_nhs_number(&nhs_number).await? else {
            return Err(VerificationError::NotVerified.into());
        };
        self.codes.require_verified(&patient, now)?;

        if self
            .ctx
            .storage
            .find_decision_type(request.decision_type_id)
            .await?
            .is_none()
        {
            return Err(FieldErrors::single("decision_type_id", "Unknown decision type").into());
        }

        let mut decision = Decision {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            decision_type_id: request.decision_type_id,
            decision_choice: request.decision_choice,
            responsible_person_given_name: None,
            responsible_person_surname: None,
            responsible_person_relationship: None,
            created_by: CITIZEN.to_string(),
            created_date: now,
            updated_by: CITIZEN.to_string(),
            updated_date: now,
        };
        ResponsiblePerson::apply_to(request.responsible_person, &mut decision);
        let patient_id = patient.id;
        let Some(stored) = self.ctx.storage.create_verified_decision(&decision).await? else {
            warn!(patient_id = %patient_id, "Verification used by a concurrent decision");
            return Err(VerificationError::NotVerified.into());
        };

        info!(decision_id = %stored.id, patient_id = %patient_id, "Decision recorded");
        self.ctx
            .audit
            .log_event(
                AuditEvent::new(
                    AuditType::DecisionRecorded,
                    "Decision recorded",
                    format!("Decision {} recorded for patient {patient_id}", stored.id),
                )
                .with_actor(CITIZEN),
            )
            .await;
        Ok(stored)
    }
}
