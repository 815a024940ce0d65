//! Decision feed for downstream consumers
//!
//! A consumer authenticates with a bearer token whose subject is its
//! `client_id`. It lists the decisions it has not adopted yet and then
//! acknowledges them in batches.

use std::collections::HashSet;

use database_layer::{AuditEvent, AuditType, Consumer, ConsumerAdoption, PendingDecision};
use error_common::{codes, FieldErrors};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ConsumerAdoptionService, ConsumerService, ServiceContext, ServiceError, ServiceResult};
use crate::middleware::AuthContext;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdoptDecisionsRequest {
    pub decision_ids: Vec<Uuid>,
}

/// Outcome of an adoption batch. Ids the consumer had already adopted, or
/// that appeared twice in the batch, are listed under `skipped`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdoptionSummary {
    pub adopted: Vec<ConsumerAdoption>,
    pub skipped: Vec<Uuid>,
}

#[derive(Clone)]
pub struct ConsumerDecisionService {
    ctx: ServiceContext,
    consumers: ConsumerService,
    adoptions: ConsumerAdoptionService,
    consumer_role: String,
}

impl ConsumerDecisionService {
    pub fn new(ctx: ServiceContext, consumer_role: impl Into<String>) -> Self {
        Self {
            consumers: ConsumerService::new(ctx.clone()),
            adoptions: ConsumerAdoptionService::new(ctx.clone()),
            ctx,
            consumer_role: consumer_role.into(),
        }
    }

    /// Resolve the registered, active consumer behind `auth`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Unauthorized`] when the caller lacks the consumer
    /// role, is not registered, or is deactivated.
    pub async fn authorize(&self, auth: &AuthContext) -> ServiceResult<Consumer> {
        if !auth.has_role(&self.consumer_role) {
            return Err(ServiceError::forbidden(format!(
                "Role '{}' is required",
                self.consumer_role
            )));
        }

        let Some(consumer) = self.consumers.retrieve_by_client_id(&auth.subject).await? else {
            warn!(subject = %auth.subject, "Token subject is not a registered consumer");
            return Err(ServiceError::forbidden("Caller is not a registered consumer"));
        };
        if !consumer.is_active {
            return Err(ServiceError::Unauthorized {
                message: format!("Consumer '{}' is not active", consumer.name),
                code: codes::authorization::CONSUMER_INACTIVE,
            });
        }
        Ok(consumer)
    }

    /// Decisions `consumer` has not adopted, oldest first.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn pending_decisions(&self, consumer: &Consumer) -> ServiceResult<Vec<PendingDecision>> {
        Ok(self.ctx.storage.list_pending_decisions(consumer.id).await?)
    }

    /// Record adoptions for every id in the batch.
    ///
    /// The whole batch is rejected if any id is unknown, so nothing is
    /// recorded for a typo.
    ///
    /// # Errors
    ///
    /// Validation failures, unknown decision ids, or storage errors.
    pub async fn adopt(
        &self,
        consumer: &Consumer,
        request: AdoptDecisionsRequest,
    ) -> ServiceResult<AdoptionSummary> {
        if request.decision_ids.is_empty() {
            return Err(FieldErrors::single("decision_ids", "At least one decision id is required").into());
        }
        if request.decision_ids.iter().any(Uuid::is_nil) {
            return Err(FieldErrors::single("decision_ids", "Decision ids must not be empty").into());
        }

        let mut unknown = Vec::new();
        for id in &request.decision_ids {
            if self.ctx.storage.find_decision(*id).await?.is_none() {
                unknown.push(id.to_string());
            }
        }
        if !unknown.is_empty() {
            return Err(FieldErrors::single(
                "decision_ids",
                format!("Unknown decisions: {}", unknown.join(", ")),
            )
            .into());
        }

        let mut seen: HashSet<Uuid> = self
            .adoptions
            .adopted_decision_ids(consumer.id)
            .await?
            .into_iter()
            .collect();
        let mut summary = AdoptionSummary {
            adopted: Vec::new(),
            skipped: Vec::new(),
        };

        for decision_id in request.decision_ids {
            if !seen.insert(decision_id) {
                summary.skipped.push(decision_id);
                continue;
            }
            let adoption = self
                .adoptions
                .new_adoption(consumer.id, decision_id, &consumer.client_id);
            match self.adoptions.insert(&adoption).await {
                Ok(stored) => summary.adopted.push(stored),
                // Lost a race with a concurrent batch for the same consumer
                Err(ServiceError::AlreadyExists { .. }) => summary.skipped.push(decision_id),
                Err(e) => return Err(e),
            }
        }

        info!(
            consumer_id = %consumer.id,
            adopted = summary.adopted.len(),
            skipped = summary.skipped.len(),
            "Decisions adopted"
        );
        self.ctx
            .audit
            .log_event(
                AuditEvent::new(
                    AuditType::DecisionsAdopted,
                    "Decisions adopted",
                    format!(
                        "Consumer {} adopted {} decisions ({} skipped)",
                        consumer.id,
                        summary.adopted.len(),
                        summary.skipped.len()
                    ),
                )
                .with_actor(consumer.client_id.clone()),
            )
            .await;
        Ok(summary)
    }
}
