use database_layer::{Consumer, PageRequest, Paged};
use error_common::FieldErrors;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ServiceContext, ServiceError, ServiceResult};
use crate::validation::{check_max_length, check_optional_email, require_id, require_text, RequestValidation};

const ENTITY: &str = "Consumer";

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConsumerRequest {
    pub name: String,
    /// Subject claim the consumer's bearer tokens carry
    pub client_id: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

impl RequestValidation for ConsumerRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &self.name);
        require_text(&mut errors, "client_id", &self.client_id);
        check_max_length(&mut errors, "name", Some(&self.name), 255);
        check_max_length(&mut errors, "client_id", Some(&self.client_id), 255);
        check_optional_email(&mut errors, "contact_email", self.contact_email.as_deref());
        errors.into_result()
    }
}

impl ConsumerRequest {
    fn apply_to(self, consumer: &mut Consumer) {
        consumer.name = self.name.trim().to_string();
        consumer.client_id = self.client_id.trim().to_string();
        consumer.contact_person = self.contact_person;
        consumer.contact_email = self.contact_email;
        consumer.contact_number = self.contact_number;
        consumer.is_active = self.is_active;
    }
}

#[derive(Clone)]
pub struct ConsumerService {
    ctx: ServiceContext,
}

impl ConsumerService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// Validation failures, or a name or client id already registered.
    pub async fn add_consumer(&self, request: ConsumerRequest, actor: &str) -> ServiceResult<Consumer> {
        request.validate()?;
        let now = self.ctx.clock.now();
        let mut consumer = Consumer {
            id: Uuid::new_v4(),
            name: String::new(),
            client_id: String::new(),
            contact_person: None,
            contact_email: None,
            contact_number: None,
            is_active: true,
            created_by: actor.to_string(),
            created_date: now,
            updated_by: actor.to_string(),
            updated_date: now,
        };
        request.apply_to(&mut consumer);

        let stored = self.ctx.storage.create_consumer(&consumer).await?;
        self.ctx
            .audit_admin_change(
                actor,
                "Consumer created",
                format!("Consumer '{}' ({}) created", stored.name, stored.id),
            )
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id.
    pub async fn retrieve_consumer(&self, id: Uuid) -> ServiceResult<Consumer> {
        let mut errors = FieldErrors::new();
        require_id(&mut errors, "id", id);
        errors.into_result()?;

        self.ctx
            .storage
            .find_consumer(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// # Errors
    ///
    /// Storage errors only.
    pub async fn retrieve_by_client_id(&self, client_id: &str) -> ServiceResult<Option<Consumer>> {
        Ok(self.ctx.storage.find_consumer_by_client_id(client_id).await?)
    }

    /// # Errors
    ///
    /// Storage errors only.
    pub async fn list_consumers(&self, page: PageRequest) -> ServiceResult<Paged<Consumer>> {
        Ok(self.ctx.storage.list_consumers(page).await?)
    }

    /// # Errors
    ///
    /// Validation failures, an unknown id, or a clash with another
    /// consumer's name or client id.
    pub async fn modify_consumer(
        &self,
        id: Uuid,
        request: ConsumerRequest,
        actor: &str,
    ) -> ServiceResult<Consumer> {
        request.validate()?;
        let mut consumer = self.retrieve_consumer(id).await?;
        request.apply_to(&mut consumer);
        consumer.updated_by = actor.to_string();
        consumer.updated_date = self.ctx.clock.now();

        let stored = self.ctx.storage.update_consumer(&consumer).await?;
        self.ctx
            .audit_admin_change(actor, "Consumer updated", format!("Consumer {id} updated"))
            .await;
        Ok(stored)
    }

    /// # Errors
    ///
    /// An unknown id, or a consumer with recorded adoptions.
    pub async fn remove_consumer(&self, id: Uuid, actor: &str) -> ServiceResult<Consumer> {
        self.retrieve_consumer(id).await?;
        let deleted = self.ctx.storage.delete_consumer(id).await?;
        self.ctx
            .audit_admin_change(actor, "Consumer deleted", format!("Consumer {id} deleted"))
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

    fn request(name: &str, client_id: &str) -> ConsumerRequest {
        ConsumerRequest {
            name: name.to_string(),
            client_id: client_id.to_string(),
            contact_person: None,
            contact_email: Some("ops@gp-system.example".to_string()),
            contact_number: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_client_id_is_unique_and_searchable() {
        let storage = MemoryStorage::new();
        let service = ConsumerService::new(ServiceContext::new(
            Arc::new(storage.clone()),
            AuditLogger::new(Arc::new(storage)),
            Arc::new(SystemClock),
        ));

        let created = service.add_consumer(request("GP System", "gp-client"), "admin").await.unwrap();
        assert!(created.is_active);

        assert!(matches!(
            service.add_consumer(request("Other", "gp-client"), "admin").await,
            Err(ServiceError::AlreadyExists { .. })
        ));

        let found = service.retrieve_by_client_id("gp-client").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(created.id));

        let mut deactivate = request("GP System", "gp-client");
        deactivate.is_active = false;
        let updated = service.modify_consumer(created.id, deactivate, "admin").await.unwrap();
        assert!(!updated.is_active);
    }

    #[test]
    fn test_bad_contact_email() {
        let mut bad = request("GP System", " ");
        bad.contact_email = Some("ops".to_string());
        let errors = bad.validate().unwrap_err();
        assert!(errors.contains("client_id"));
        assert!(errors.contains("contact_email"));
    }
}
