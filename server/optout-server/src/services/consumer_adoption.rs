use chrono::{DateTime, Utc};
use database_layer::{ConsumerAdoption, PageRequest, Paged};
use error_common::FieldErrors;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ServiceContext, ServiceError, ServiceResult};
use crate::validation::{require_id, RequestValidation};

const ENTITY: &str = "ConsumerAdoption";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConsumerAdoptionRequest {
    pub consumer_id: Uuid,
    pub decision_id: Uuid,
    /// Defaults to now
    #[serde(default)]
    pub adoption_date: Option<DateTime<Utc>>,
}

impl RequestValidation for ConsumerAdoptionRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_id(&mut errors, "consumer_id", self.consumer_id);
        require_id(&mut errors, "decision_id", self.decision_id);
        errors.into_result()
    }
}

#[derive(Clone)]
pub struct ConsumerAdoptionService {
    ctx: ServiceContext,
}

impl ConsumerAdoptionService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Adoption row stamped for creation, not yet stored.
    pub fn new_adoption(&self, consumer_id: Uuid, decision_id: Uuid, actor: &str) -> ConsumerAdoption {
        let now = self.ctx.clock.now();
        ConsumerAdoption {
            id: Uuid::new_v4(),
            consumer_id,
            decision_id,
            adoption_date: now,
            created_by: actor.to_string(),
            created_date: now,
            updated_by: actor.to_string(),
            updated_date: now,
        }
    }

    /// # Errors
    ///
    /// Validation failures, dangling references, or a pair already adopted.
    pub async fn add_adoption(
        &self,
        request: ConsumerAdoptionRequest,
        actor: &str,
    ) -> ServiceResult<ConsumerAdoption> {
        request.validate()?;
        let mut adoption = self.new_adoption(request.consumer_id, request.decision_id, actor);
        if let Some(date) = request.adoption_date {
            adoption.adoption_date = date;
        }
        let stored = self.insert(&adoption).await?;
        self.ctx
            .audit_admin_change(actor, "Adoption created", format!("Adoption {} created", stored.id))
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// Dangling references or a pair already adopted.
    pub async fn insert(&self, adoption: &ConsumerAdoption) -> ServiceResult<ConsumerAdoption> {
        Ok(self.ctx.storage.create_adoption(adoption).await?)
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id.
    pub async fn retrieve_adoption(&self, id: Uuid) -> ServiceResult<ConsumerAdoption> {
        let mut errors = FieldErrors::new();
        require_id(&mut errors, "id", id);
        errors.into_result()?;

        self.ctx
            .storage
            .find_adoption(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// # Errors
    ///
    /// Storage errors only.
    pub async fn list_adoptions(&self, page: PageRequest) -> ServiceResult<Paged<ConsumerAdoption>> {
        Ok(self.ctx.storage.list_adoptions(page).await?)
    }

    /// # Errors
    ///
    /// Storage errors only.
    pub async fn adopted_decision_ids(&self, consumer_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        Ok(self.ctx.storage.list_adopted_decision_ids(consumer_id).await?)
    }

    /// # Errors
    ///
    /// Validation failures, an unknown id, dangling references, or a clash
    /// with an existing pair.
    pub async fn modify_adoption(
        &self,
        id: Uuid,
        request: ConsumerAdoptionRequest,
        actor: &str,
    ) -> ServiceResult<ConsumerAdoption> {
        request.validate()?;
        let mut adoption = self.retrieve_adoption(id).await?;
        adoption.consumer_id = request.consumer_id;
        adoption.decision_id = request.decision_id;
        if let Some(date) = request.adoption_date {
            adoption.adoption_date = date;
        }
        adoption.updated_by = actor.to_string();
        adoption.updated_date = self.ctx.clock.now();

        let stored = self.ctx.storage.update_adoption(&adoption).await?;
        self.ctx
            .audit_admin_change(actor, "Adoption updated", format!("Adoption {id} updated"))
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// An unknown id.
    pub async fn remove_adoption(&self, id: Uuid, actor: &str) -> ServiceResult<ConsumerAdoption> {
        self.retrieve_adoption(id).await?;
        let deleted = self.ctx.storage.delete_adoption(id).await?;
        self.ctx
            .audit_admin_change(actor, "Adoption deleted", format!("Adoption {id} deleted"))
            .await;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use database_layer::{AuditLogger, MemoryStorage};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_nil_ids_and_dangling_references() {
        let storage = MemoryStorage::new();
        let service = ConsumerAdoptionService::new(ServiceContext::new(
            Arc::new(storage.clone()),
            AuditLogger::new(Arc::new(storage)),
            Arc::new(SystemClock),
        ));

        let nil = ConsumerAdoptionRequest {
            consumer_id: Uuid::nil(),
            decision_id: Uuid::nil(),
            adoption_date: None,
        };
        match service.add_adoption(nil, "admin").await {
            Err(ServiceError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }

        let dangling = ConsumerAdoptionRequest {
            consumer_id: Uuid::new_v4(),
            decision_id: Uuid::new_v4(),
            adoption_date: None,
        };
        assert!(matches!(
            service.add_adoption(dangling, "admin").await,
            Err(ServiceError::InvalidReference { .. })
        ));
    }
}
