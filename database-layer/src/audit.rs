// Audit trail for security-relevant events
use crate::models::Audit;
use crate::store::AuditStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// What happened. Stored as text in `audits.audit_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditType {
    PatientSearch,
    CodeRequested,
    CodeVerified,
    VerificationFailed,
    DecisionRecorded,
    DecisionsAdopted,
    AdminChange,
}

impl AuditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditType::PatientSearch => "PatientSearch",
            AuditType::CodeRequested => "CodeRequested",
            AuditType::CodeVerified => "CodeVerified",
            AuditType::VerificationFailed => "VerificationFailed",
            AuditType::DecisionRecorded => "DecisionRecorded",
            AuditType::DecisionsAdopted => "DecisionsAdopted",
            AuditType::AdminChange => "AdminChange",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Information,
    Warning,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Information => "Information",
            AuditLevel::Warning => "Warning",
            AuditLevel::Error => "Error",
        }
    }
}

/// One audit entry before it is stored.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub correlation_id: String,
    pub audit_type: AuditType,
    pub level: AuditLevel,
    pub title: String,
    pub message: String,
    pub actor: String,
}

impl AuditEvent {
    pub fn new(audit_type: AuditType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            audit_type,
            level: AuditLevel::Information,
            title: title.into(),
            message: message.into(),
            actor: "system".to_string(),
        }
    }

    pub fn with_level(mut self, level: AuditLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}

/// Writes audit rows through an [`AuditStore`].
///
/// A failed write is logged and swallowed; auditing never fails the request
/// that triggered it.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn AuditStore>,
    enabled: bool,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Record an event, returning the stored row when the write succeeded.
    pub async fn log_event(&self, event: AuditEvent) -> Option<Audit> {
        if !self.enabled {
            return None;
        }

        info!(
            target: "audit",
            correlation_id = %event.correlation_id,
            audit_type = event.audit_type.as_str(),
            level = event.level.as_str(),
            title = %event.title,
            "Audit event"
        );

        let now = Utc::now();
        let audit = Audit {
            id: Uuid::new_v4(),
            correlation_id: event.correlation_id,
            audit_type: event.audit_type.as_str().to_string(),
            title: event.title,
            message: event.message,
            log_level: event.level.as_str().to_string(),
            created_by: event.actor.clone(),
            created_date: now,
            updated_by: event.actor,
            updated_date: now,
        };

        match self.store.create_audit(&audit).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                error!(
                    target: "audit",
                    error = %e,
                    correlation_id = %audit.correlation_id,
                    "Failed to store audit entry"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use crate::models::PageRequest;

    #[tokio::test]
    async fn test_log_event_stores_row() {
        let storage = MemoryStorage::new();
        let logger = AuditLogger::new(Arc::new(storage.clone()));

        let stored = logger
            .log_event(
                AuditEvent::new(AuditType::CodeVerified, "Code verified", "patient verified")
                    .with_correlation_id("corr-1")
                    .with_actor("citizen"),
            )
            .await
            .unwrap();

        assert_eq!(stored.audit_type, "CodeVerified");
        assert_eq!(stored.log_level, "Information");
        assert_eq!(stored.correlation_id, "corr-1");
        assert_eq!(stored.created_by, "citizen");

        let page = storage.list_audits(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_disabled_logger_writes_nothing() {
        let storage = MemoryStorage::new();
        let logger = AuditLogger::new(Arc::new(storage.clone())).with_enabled(false);

        let stored = logger
            .log_event(AuditEvent::new(AuditType::AdminChange, "t", "m"))
            .await;

        assert!(stored.is_none());
        let page = storage.list_audits(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }
}
