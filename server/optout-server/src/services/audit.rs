use database_layer::{Audit, PageRequest, Paged};
use error_common::FieldErrors;
use uuid::Uuid;

use super::{ServiceContext, ServiceError, ServiceResult};
use crate::validation::require_id;

/// Read-only access to the audit trail. Rows are written through
/// [`database_layer::AuditLogger`].
#[derive(Clone)]
pub struct AuditService {
    ctx: ServiceContext,
}

impl AuditService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn list_audits(&self, page: PageRequest) -> ServiceResult<Paged<Audit>> {
        Ok(self.ctx.storage.list_audits(page).await?)
    }

    /// # Errors
    ///
    /// [`ServiceError::NotFound`] for an unknown id.
    pub async fn retrieve_audit(&self, id: Uuid) -> ServiceResult<Audit> {
        let mut errors = FieldErrors::new();
        require_id(&mut errors, "id", id);
        errors.into_result()?;

        self.ctx
            .storage
            .find_audit(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Audit", id))
    }
}
