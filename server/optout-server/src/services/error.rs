use database_layer::DatabaseError;
use error_common::{codes, ErrorCategory, FieldErrors};
use notification_service::NotificationError;
use pds_service::PdsError;
use thiserror::Error;

use crate::validation_code::VerificationError;

/// Failure of an external system the service depends on.
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("Storage failure: {0}")]
    Storage(DatabaseError),

    #[error("PDS failure: {0}")]
    Pds(PdsError),

    #[error("Notification failure: {0}")]
    Notification(NotificationError),
}

impl DependencyError {
    /// Message safe to show a caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            DependencyError::Storage(_) => "The data store could not complete the request",
            DependencyError::Pds(_) => "The demographics service could not complete the request",
            DependencyError::Notification(_) => "The validation code could not be sent",
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists ({detail})")]
    AlreadyExists { entity: &'static str, detail: String },

    #[error("{entity} refers to a record that does not exist or is still referenced ({detail})")]
    InvalidReference { entity: &'static str, detail: String },

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("More than one patient matches these details; search by NHS number instead")]
    AmbiguousMatch,

    #[error("{message}")]
    Unauthorized { message: String, code: &'static str },

    #[error(transparent)]
    Dependency(#[from] DependencyError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Unauthorized {
            message: message.into(),
            code: codes::authorization::ACCESS_DENIED,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidReference { .. } => {
                ErrorCategory::Validation
            }
            ServiceError::NotFound { .. } => ErrorCategory::NotFound,
            ServiceError::AlreadyExists { .. } | ServiceError::AmbiguousMatch => {
                ErrorCategory::Conflict
            }
            ServiceError::Verification(_) => ErrorCategory::Verification,
            ServiceError::Unauthorized { .. } => ErrorCategory::Authorization,
            ServiceError::Dependency(_) => ErrorCategory::Dependency,
        }
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DatabaseError::AlreadyExists { entity, detail } => {
                ServiceError::AlreadyExists { entity, detail }
            }
            DatabaseError::ForeignKeyViolation { entity, detail } => {
                ServiceError::InvalidReference { entity, detail }
            }
            other => ServiceError::Dependency(DependencyError::Storage(other)),
        }
    }
}

impl From<PdsError> for ServiceError {
    fn from(error: PdsError) -> Self {
        ServiceError::Dependency(DependencyError::Pds(error))
    }
}

impl From<NotificationError> for ServiceError {
    fn from(error: NotificationError) -> Self {
        match error {
            NotificationError::MissingRecipient(what) => ServiceError::Validation(
                FieldErrors::single("notification_preference", format!("No {what} on record")),
            ),
            NotificationError::UnsupportedChannel { provider, channel } => {
                ServiceError::Validation(FieldErrors::single(
                    "notification_preference",
                    format!("{provider} cannot deliver by {channel}"),
                ))
            }
            other => ServiceError::Dependency(DependencyError::Notification(other)),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_translated() {
        let not_found = ServiceError::from(DatabaseError::not_found("Patient", "abc"));
        assert!(matches!(not_found, ServiceError::NotFound { entity: "Patient", .. }));

        let fk = ServiceError::from(DatabaseError::foreign_key("Decision", "decisions_patient_id_fkey"));
        assert_eq!(fk.category(), ErrorCategory::Validation);

        let down = ServiceError::from(DatabaseError::ConnectionFailed("refused".to_string()));
        assert_eq!(down.category(), ErrorCategory::Dependency);
    }

    #[test]
    fn test_missing_recipient_is_a_validation_error() {
        let error = ServiceError::from(NotificationError::MissingRecipient("email address"));
        match error {
            ServiceError::Validation(fields) => assert!(fields.contains("notification_preference")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
