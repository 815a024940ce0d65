use database_layer::{Decision, PageRequest, Paged};
use error_common::FieldErrors;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ServiceContext, ServiceError, ServiceResult};
use crate::validation::{check_max_length, require_id, require_text, RequestValidation};

const ENTITY: &str = "Decision";

/// Parent or guardian recording a decision for the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResponsiblePerson {
    pub given_name: String,
    pub surname: String,
    /// e.g. "Mother", "Legal guardian"
    pub relationship: String,
}

impl ResponsiblePerson {
    pub(crate) fn check(&self, errors: &mut FieldErrors) {
        require_text(errors, "responsible_person.given_name", &self.given_name);
        require_text(errors, "responsible_person.surname", &self.surname);
        require_text(errors, "responsible_person.relationship", &self.relationship);
    }

    pub(crate) fn apply_to(responsible: Option<Self>, decision: &mut Decision) {
        let (given_name, surname, relationship) = match responsible {
            Some(person) => (
                Some(person.given_name.trim().to_string()),
                Some(person.surname.trim().to_string()),
                Some(person.relationship.trim().to_string()),
            ),
            None => (None, None, None),
        };
        decision.responsible_person_given_name = given_name;
        decision.responsible_person_surname = surname;
        decision.responsible_person_relationship = relationship;
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DecisionRequest {
    pub patient_id: Uuid,
    pub decision_type_id: Uuid,
    #[serde(default)]
    pub decision_choice: Option<String>,
    #[serde(default)]
    pub responsible_person: Option<ResponsiblePerson>,
}

impl RequestValidation for DecisionRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_id(&mut errors, "patient_id", self.patient_id);
        require_id(&mut errors, "decision_type_id", self.decision_type_id);
        check_max_length(&mut errors, "decision_choice", self.decision_choice.as_deref(), 255);
        if let Some(person) = &self.responsible_person {
            person.check(&mut errors);
        }
        errors.into_result()
    }
}

#[derive(Clone)]
pub struct DecisionService {
    ctx: ServiceContext,
}

impl DecisionService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Store a decision. Both references must exist.
    ///
    /// # Errors
    ///
    /// Validation failures, or a patient or decision type that does not
    /// exist.
    pub async fn add_decision(&self, request: DecisionRequest, actor: &str) -> ServiceResult<Decision> {
        request.validate()?;
        let now = self.ctx.clock.now();
        let mut decision = Decision {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            decision_type_id: request.decision_type_id,
            decision_choice: request.decision_choice,
            responsible_person_given_name: None,
            responsible_person_surname: None,
            responsible_person_relationship: None,
            created_by: actor.to_string(),
            created_date: now,
            updated_by: actor.to_string(),
            updated_date: now,
        };
        ResponsiblePerson::apply_to(request.responsible_person, &mut decision);

        let stored = self.ctx.storage.create_decision(&decision).await?;
        self.ctx
            .audit_admin_change(actor, "Decision created", format!("Decision {} created", stored.id))
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id.
    pub async fn retrieve_decision(&self, id: Uuid) -> ServiceResult<Decision> {
        let mut errors = FieldErrors::new();
        require_id(&mut errors, "id", id);
        errors.into_result()?;

        self.ctx
            .storage
            .find_decision(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// # Errors
    ///
    /// Storage errors only.
    pub async fn list_decisions(&self, page: PageRequest) -> ServiceResult<Paged<Decision>> {
        Ok(self.ctx.storage.list_decisions(page).await?)
    }

    /// The one way to change a decision after it was recorded, including one
    /// already adopted by consumers.
    ///
    /// # Errors
    ///
    /// Validation failures, an unknown id, or dangling references.
    pub async fn modify_decision(
        &self,
        id: Uuid,
        request: DecisionRequest,
        actor: &str,
    ) -> ServiceResult<Decision> {
        request.validate()?;
        let mut decision = self.retrieve_decision(id).await?;
        decision.patient_id = request.patient_id;
        decision.decision_type_id = request.decision_type_id;
        decision.decision_choice = request.decision_choice;
        ResponsiblePerson::apply_to(request.responsible_person, &mut decision);
        decision.updated_by = actor.to_string();
        decision.updated_date = self.ctx.clock.now();

        let stored = self.ctx.storage.update_decision(&decision).await?;
        self.ctx
            .audit_admin_change(actor, "Decision updated", format!("Decision {id} updated"))
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// An unknown id, or a decision that consumers have adopted.
    pub async fn remove_decision(&self, id: Uuid, actor: &str) -> ServiceResult<Decision> {
        self.retrieve_decision(id).await?;
        let deleted = self.ctx.storage.delete_decision(id).await?;
        self.ctx
            .audit_admin_change(actor, "Decision deleted", format!("Decision {id} deleted"))
            .await;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::services::{DecisionTypeRequest, DecisionTypeService};
    use database_layer::{AuditLogger, MemoryStorage};
    use std::sync::Arc;

    fn context() -> ServiceContext {
        let storage = MemoryStorage::new();
        ServiceContext::new(
            Arc::new(storage.clone()),
            AuditLogger::new(Arc::new(storage)),
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn test_unknown_patient_is_an_invalid_reference() {
        let ctx = context();
        let decision_type = DecisionTypeService::new(ctx.clone())
            .add_decision_type(DecisionTypeRequest { name: "Opt-Out".to_string() }, "admin")
            .await
            .unwrap();

        let result = DecisionService::new(ctx)
            .add_decision(
                DecisionRequest {
                    patient_id: Uuid::new_v4(),
                    decision_type_id: decision_type.id,
                    decision_choice: None,
                    responsible_person: None,
                },
                "admin",
            )
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidReference { .. })));
    }

    #[test]
    fn test_responsible_person_fields_are_required_together() {
        let request = DecisionRequest {
            patient_id: Uuid::new_v4(),
            decision_type_id: Uuid::new_v4(),
            decision_choice: Some("Opt-Out".to_string()),
            responsible_person: Some(ResponsiblePerson {
                given_name: "Ann".to_string(),
                surname: String::new(),
                relationship: " ".to_string(),
            }),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.contains("responsible_person.surname"));
        assert!(errors.contains("responsible_person.relationship"));
        assert!(!errors.contains("responsible_person.given_name"));
    }
}
