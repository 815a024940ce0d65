use database_layer::{DecisionType, PageRequest, Paged};
use error_common::FieldErrors;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ServiceContext, ServiceError, ServiceResult};
use crate::validation::{check_max_length, require_id, require_text, RequestValidation};

const ENTITY: &str = "DecisionType";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DecisionTypeRequest {
    /// e.g. "Opt-Out"
    pub name: String,
}

impl RequestValidation for DecisionTypeRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &self.name);
        check_max_length(&mut errors, "name", Some(&self.name), 100);
        errors.into_result()
    }
}

#[derive(Clone)]
pub struct DecisionTypeService {
    ctx: ServiceContext,
}

impl DecisionTypeService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// Validation failures or a duplicate name.
    pub async fn add_decision_type(
        &self,
        request: DecisionTypeRequest,
        actor: &str,
    ) -> ServiceResult<DecisionType> {
        request.validate()?;
        let now = self.ctx.clock.now();
        let decision_type = DecisionType {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            created_by: actor.to_string(),
            created_date: now,
            updated_by: actor.to_string(),
            updated_date: now,
        };
        let stored = self.ctx.storage.create_decision_type(&decision_type).await?;
        self.ctx
            .audit_admin_change(
                actor,
                "Decision type created",
                format!("Decision type '{}' ({}) created", stored.name, stored.id),
            )
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id.
    pub async fn retrieve_decision_type(&self, id: Uuid) -> ServiceResult<DecisionType> {
        let mut errors = FieldErrors::new();
        require_id(&mut errors, "id", id);
        errors.into_result()?;

        self.ctx
            .storage
            .find_decision_type(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// # Errors
    ///
    /// Storage errors only.
    pub async fn list_decision_types(&self, page: PageRequest) -> ServiceResult<Paged<DecisionType>> {
        Ok(self.ctx.storage.list_decision_types(page).await?)
    }

    /// # Errors
    ///
    /// Validation failures, an unknown id, or a duplicate name.
    pub async fn modify_decision_type(
        &self,
        id: Uuid,
        request: DecisionTypeRequest,
        actor: &str,
    ) -> ServiceResult<DecisionType> {
        request.validate()?;
        let mut decision_type = self.retrieve_decision_type(id).await?;
        decision_type.name = request.name.trim().to_string();
        decision_type.updated_by = actor.to_string();
        decision_type.updated_date = self.ctx.clock.now();

        let stored = self.ctx.storage.update_decision_type(&decision_type).await?;
        self.ctx
            .audit_admin_change(actor, "Decision type updated", format!("Decision type {id} updated"))
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// An unknown id, or a type still used by decisions.
    pub async fn remove_decision_type(&self, id: Uuid, actor: &str) -> ServiceResult<DecisionType> {
        self.retrieve_decision_type(id).await?;
        let deleted = self.ctx.storage.delete_decision_type(id).await?;
        self.ctx
            .audit_admin_change(actor, "Decision type deleted", format!("Decision type {id} deleted"))
            .await;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use database_layer::{AuditLogger, AuditStore, MemoryStorage};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_crud_writes_admin_audits() {
        let storage = MemoryStorage::new();
        let service = DecisionTypeService::new(ServiceContext::new(
            Arc::new(storage.clone()),
            AuditLogger::new(Arc::new(storage.clone())),
            Arc::new(SystemClock),
        ));

        let created = service
            .add_decision_type(DecisionTypeRequest { name: " Opt-Out ".to_string() }, "admin")
            .await
            .unwrap();
        assert_eq!(created.name, "Opt-Out");

        let renamed = service
            .modify_decision_type(created.id, DecisionTypeRequest { name: "Opt-In".to_string() }, "admin")
            .await
            .unwrap();
        assert_eq!(renamed.name, "Opt-In");

        service.remove_decision_type(created.id, "admin").await.unwrap();
        assert!(matches!(
            service.retrieve_decision_type(created.id).await,
            Err(ServiceError::NotFound { .. })
        ));

        let audits = storage.list_audits(PageRequest::default()).await.unwrap();
        assert_eq!(audits.total, 3);
        assert!(audits.items.iter().all(|a| a.audit_type == "AdminChange"));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let storage = MemoryStorage::new();
        let service = DecisionTypeService::new(ServiceContext::new(
            Arc::new(storage.clone()),
            AuditLogger::new(Arc::new(storage)),
            Arc::new(SystemClock),
        ));
        assert!(matches!(
            service
                .add_decision_type(DecisionTypeRequest { name: "  ".to_string() }, "admin")
                .await,
            Err(ServiceError::Validation(_))
        ));
    }
}
