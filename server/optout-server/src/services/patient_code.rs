//! Issue and verify the one-time codes that prove a citizen's identity

use std::sync::Arc;

use chrono::{DateTime, Utc};
use database_layer::{AuditEvent, AuditLevel, AuditType, NotificationPreference, Patient};
use error_common::FieldErrors;
use notification_service::{CodeNotification, NotificationBroker, NotificationChannel};
use pds_service::{PdsBroker, PdsPatient};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::patient::refresh_from_pds;
use super::{PatientService, ServiceContext, ServiceError, ServiceResult};
use crate::validation::{check_nhs_number, normalise_nhs_number, require_text, RequestValidation};
use crate::validation_code::{CodeState, ValidationCodes, VerificationError};

const CITIZEN: &str = "citizen";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CodeRequest {
    pub nhs_number: String,
    pub notification_preference: NotificationPreference,
    /// Replace a code that is still live
    #[serde(default)]
    pub generate_new_code: bool,
}

impl RequestValidation for CodeRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_nhs_number(&mut errors, "nhs_number", &normalise_nhs_number(&self.nhs_number));
        errors.into_result()
    }
}

/// Where and until when the code is valid. Never carries the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CodeRequestReceipt {
    pub notification_preference: NotificationPreference,
    pub expires_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyCodeRequest {
    pub nhs_number: String,
    pub validation_code: String,
}

impl RequestValidation for VerifyCodeRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_nhs_number(&mut errors, "nhs_number", &normalise_nhs_number(&self.nhs_number));
        require_text(&mut errors, "validation_code", &self.validation_code);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CodeVerification {
    pub verified: bool,
    pub verified_on: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PatientCodeService {
    ctx: ServiceContext,
    patients: PatientService,
    pds: Arc<dyn PdsBroker>,
    notifications: Arc<dyn NotificationBroker>,
    codes: ValidationCodes,
}

impl PatientCodeService {
    pub fn new(
        ctx: ServiceContext,
        pds: Arc<dyn PdsBroker>,
        notifications: Arc<dyn NotificationBroker>,
        codes: ValidationCodes,
    ) -> Self {
        Self {
            patients: PatientService::new(ctx.clone()),
            ctx,
            pds,
            notifications,
            codes,
        }
    }

    /// Refresh the local patient from PDS, issue a code and send it on the
    /// chosen channel.
    ///
    /// # Errors
    ///
    /// - validation: bad NHS number, or no contact detail for the channel
    /// - [`VerificationError::CodeAlreadyIssued`] when a live code exists and
    ///   `generate_new_code` is false
    /// - not found when PDS has no record
    /// - dependency failures from PDS, storage or the notification provider
    pub async fn request_code(&self, request: CodeRequest) -> ServiceResult<CodeRequestReceipt> {
        request.validate()?;
        let nhs_number = normalise_nhs_number(&request.nhs_number);
        let preference = request.notification_preference;

        let record = self
            .pds
            .get_patient(&nhs_number)
            .await?
            .ok_or_else(|| ServiceError::not_found("Patient", "NHS number"))?;
        check_contact_details(&record, preference)?;

        let now = self.ctx.clock.now();
        let existing = self.patients.find_by_nhs_number(&nhs_number).await?;
        let (mut patient, is_new) = match existing {
            Some(mut patient) => {
                if self.codes.state(&patient, now) == CodeState::Issued && !request.generate_new_code {
                    if let Some(expires_on) = patient.validation_code_expires_on {
                        return Err(VerificationError::CodeAlreadyIssued { expires_on }.into());
                    }
                }
                refresh_from_pds(&mut patient, &record);
                (patient, false)
            }
            None => (self.patients.from_pds(&record, CITIZEN), true),
        };
        patient.notification_preference = preference;

        let code = self.codes.issue(&mut patient, now);
        let patient = if is_new {
            self.patients.insert(&patient).await?
        } else {
            self.patients.save(patient, CITIZEN).await?
        };
        let expires_on = patient.validation_code_expires_on.unwrap_or(now);

        let notification = CodeNotification {
            channel: channel_for(preference),
            given_name: patient.given_name.clone(),
            surname: patient.surname.clone(),
            email: patient.email.clone(),
            phone: patient.phone.clone(),
            address: patient.address.clone(),
            post_code: patient.post_code.clone(),
            validation_code: code,
            expires_on,
        };

        match self.notifications.send_code(&notification).await {
            Ok(delivery) => {
                info!(
                    patient_id = %patient.id,
                    channel = %delivery.channel,
                    provider = delivery.provider,
                    message_id = %delivery.message_id,
                    "Validation code sent"
                );
            }
            Err(e) => {
                self.withdraw_code(patient).await;
                return Err(e.into());
            }
        }

        self.ctx
            .audit
            .log_event(
                AuditEvent::new(
                    AuditType::CodeRequested,
                    "Validation code issued",
                    format!("Code issued to patient {} by {preference}", patient.id),
                )
                .with_actor(CITIZEN),
            )
            .await;

        Ok(CodeRequestReceipt {
            notification_preference: preference,
            expires_on,
        })
    }

    /// Check a submitted code. Wrong codes use up an attempt.
    ///
    /// # Errors
    ///
    /// A [`VerificationError`] for each failed check, or storage failures.
    pub async fn verify_code(&self, request: VerifyCodeRequest) -> ServiceResult<CodeVerification> {
        request.validate()?;
        let nhs_number = normalise_nhs_number(&request.nhs_number);

        let Some(patient) = self.patients.find_by_nhs_number(&nhs_number).await? else {
            return Err(VerificationError::NoCodeIssued.into());
        };

        let now = self.ctx.clock.now();
        let patient_id = patient.id;

        match self.settle_attempt(patient, &request.validation_code, now).await? {
            Ok(()) => {
                self.ctx
                    .audit
                    .log_event(
                        AuditEvent::new(
                            AuditType::CodeVerified,
                            "Validation code verified",
                            format!("Patient {patient_id} verified"),
                        )
                        .with_actor(CITIZEN),
                    )
                    .await;
                Ok(CodeVerification {
                    verified: true,
                    verified_on: now,
                })
            }
            Err(failure) => {
                warn!(patient_id = %patient_id, reason = %failure, "Validation code rejected");
                self.ctx
                    .audit
                    .log_event(
                        AuditEvent::new(
                            AuditType::VerificationFailed,
                            "Validation code rejected",
                            format!("Patient {patient_id}: {failure}"),
                        )
                        .with_level(AuditLevel::Warning)
                        .with_actor(CITIZEN),
                    )
                    .await;
                Err(failure.into())
            }
        }
    }

    /// Decide the attempt against the loaded row, then persist the outcome
    /// with a write that only applies while the code is still open. A write
    /// that finds the row already moved on reports the row's current state.
    async fn settle_attempt(
        &self,
        mut patient: Patient,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Result<(), VerificationError>> {
        let Some(stored_code) = patient.validation_code.clone() else {
            return Ok(Err(VerificationError::NoCodeIssued));
        };
        let max = self.codes.max_retry_count();

        match self.codes.verify(&mut patient, submitted, now) {
            Ok(()) => {
                let matched = self
                    .ctx
                    .storage
                    .mark_code_matched(patient.id, &stored_code, max, CITIZEN, now)
                    .await?;
                if matched.is_some() {
                    return Ok(Ok(()));
                }
            }
            Err(VerificationError::InvalidCode { .. }) => {
                let counted = self
                    .ctx
                    .storage
                    .record_failed_attempt(patient.id, &stored_code, max, CITIZEN, now)
                    .await?;
                if let Some(updated) = counted {
                    return Ok(Err(VerificationError::InvalidCode {
                        remaining_attempts: (max - updated.retry_count).max(0),
                    }));
                }
            }
            Err(other) => return Ok(Err(other)),
        }

        let current = self.ctx.storage.find_patient(patient.id).await?;
        let failure = match current {
            None => VerificationError::NoCodeIssued,
            Some(current) => match self.codes.check_open(&current, now) {
                Err(failure) => failure,
                // Code was replaced mid-attempt; the old one no longer counts
                Ok(()) => VerificationError::InvalidCode {
                    remaining_attempts: (max - current.retry_count).max(0),
                },
            },
        };
        Ok(Err(failure))
    }

    /// Drop a code that could not be delivered so the citizen can ask again.
    async fn withdraw_code(&self, mut patient: Patient) {
        let patient_id = patient.id;
        self.codes.consume(&mut patient);
        if let Err(e) = self.patients.save(patient, CITIZEN).await {
            error!(patient_id = %patient_id, error = %e, "Failed to withdraw undelivered code");
        }
    }
}

fn channel_for(preference: NotificationPreference) -> NotificationChannel {
    match preference {
        NotificationPreference::Email => NotificationChannel::Email,
        NotificationPreference::Sms => NotificationChannel::Sms,
        NotificationPreference::Letter => NotificationChannel::Letter,
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn check_contact_details(record: &PdsPatient, preference: NotificationPreference) -> Result<(), FieldErrors> {
    let (present, message) = match preference {
        NotificationPreference::Email => (
            has_text(record.email.as_deref()),
            "No email address is held for this patient",
        ),
        NotificationPreference::Sms => (
            has_text(record.phone.as_deref()),
            "No mobile number is held for this patient",
        ),
        NotificationPreference::Letter => (
            has_text(record.address.as_deref()) && has_text(record.post_code.as_deref()),
            "No postal address is held for this patient",
        ),
    };
    let mut errors = FieldErrors::new();
    errors.require("notification_preference", present, message);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use chrono::{Duration, NaiveDate};
    use config_engine::ValidationCodeSettings;
    use database_layer::{AuditLogger, AuditStore, MemoryStorage, PageRequest, PatientStore};
    use mockall::predicate::always;
    use notification_service::{Delivery, MockNotificationBroker, NotificationError};
    use pds_service::FakePdsBroker;
    use parking_lot::Mutex;

    const NHS: &str = "9434765919";

    struct Fixture {
        storage: MemoryStorage,
        clock: Arc<FixedClock>,
        service: PatientCodeService,
        sent: Arc<Mutex<Vec<CodeNotification>>>,
    }

    fn record() -> PdsPatient {
        PdsPatient {
            nhs_number: NHS.to_string(),
            title: None,
            given_name: "Jane".to_string(),
            surname: "Smith".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 2).unwrap(),
            gender: None,
            email: Some("jane@example.com".to_string()),
            phone: None,
            address: Some("1 High Street, Leeds".to_string()),
            post_code: None,
        }
    }

    fn capturing_broker(sent: Arc<Mutex<Vec<CodeNotification>>>) -> MockNotificationBroker {
        let mut broker = MockNotificationBroker::new();
        broker.expect_send_code().with(always()).returning(move |n| {
            sent.lock().push(n.clone());
            Ok(Delivery {
                message_id: "msg-1".to_string(),
                channel: n.channel,
                provider: "mock",
            })
        });
        broker
    }

    fn fixture_with(broker: MockNotificationBroker) -> Fixture {
        let storage = MemoryStorage::new();
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let ctx = ServiceContext::new(
            Arc::new(storage.clone()),
            AuditLogger::new(Arc::new(storage.clone())),
            clock.clone(),
        );
        let service = PatientCodeService::new(
            ctx,
            Arc::new(FakePdsBroker::new(vec![record()])),
            Arc::new(broker),
            ValidationCodes::new(&ValidationCodeSettings::default()),
        );
        Fixture {
            storage,
            clock,
            service,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn fixture() -> Fixture {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut fixture = fixture_with(capturing_broker(sent.clone()));
        fixture.sent = sent;
        fixture
    }

    fn code_request(generate_new_code: bool) -> CodeRequest {
        CodeRequest {
            nhs_number: NHS.to_string(),
            notification_preference: NotificationPreference::Email,
            generate_new_code,
        }
    }

    fn last_code(fixture: &Fixture) -> String {
        fixture
            .sent
            .lock()
            .last()
            .map(|n| n.validation_code.clone())
            .unwrap()
    }

    #[tokio::test]
    async fn test_request_code_creates_patient_and_sends_code() {
        let fixture = fixture();
        let receipt = fixture.service.request_code(code_request(false)).await.unwrap();
        assert_eq!(receipt.expires_on, fixture.clock.now() + Duration::minutes(1440));

        let stored = fixture.storage.find_patient_by_nhs_number(NHS).await.unwrap().unwrap();
        let code = last_code(&fixture);
        assert_eq!(stored.validation_code.as_deref(), Some(code.as_str()));
        assert_eq!(stored.retry_count, 0);

        let audits = fixture.storage.list_audits(PageRequest::default()).await.unwrap();
        assert!(audits.items.iter().any(|a| a.audit_type == "CodeRequested"));
        assert!(audits.items.iter().all(|a| !a.message.contains(&code)));
    }

    #[tokio::test]
    async fn test_live_code_blocks_a_second_request_unless_forced() {
        let fixture = fixture();
        fixture.service.request_code(code_request(false)).await.unwrap();

        assert!(matches!(
            fixture.service.request_code(code_request(false)).await,
            Err(ServiceError::Verification(VerificationError::CodeAlreadyIssued { .. }))
        ));

        fixture.service.request_code(code_request(true)).await.unwrap();
        assert_eq!(fixture.sent.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_contact_detail_is_rejected_before_sending() {
        let mut broker = MockNotificationBroker::new();
        broker.expect_send_code().never();
        let fixture = fixture_with(broker);

        let mut request = code_request(false);
        request.notification_preference = NotificationPreference::Sms;
        match fixture.service.request_code(request).await {
            Err(ServiceError::Validation(errors)) => {
                assert!(errors.contains("notification_preference"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        // Address without a postcode cannot be posted
        let mut letter = code_request(false);
        letter.notification_preference = NotificationPreference::Letter;
        assert!(matches!(
            fixture.service.request_code(letter).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_delivery_withdraws_the_code() {
        let mut broker = MockNotificationBroker::new();
        broker
            .expect_send_code()
            .returning(|_| Err(NotificationError::Unavailable("provider down".to_string())));
        let fixture = fixture_with(broker);

        assert!(matches!(
            fixture.service.request_code(code_request(false)).await,
            Err(ServiceError::Dependency(_))
        ));
        let stored = fixture.storage.find_patient_by_nhs_number(NHS).await.unwrap().unwrap();
        assert_eq!(stored.validation_code, None);
    }

    #[tokio::test]
    async fn test_verify_flow() {
        let fixture = fixture();
        fixture.service.request_code(code_request(false)).await.unwrap();
        let code = last_code(&fixture);

        let wrong = fixture
            .service
            .verify_code(VerifyCodeRequest {
                nhs_number: NHS.to_string(),
                validation_code: "XXXXX".to_string(),
            })
            .await;
        assert!(matches!(
            wrong,
            Err(ServiceError::Verification(VerificationError::InvalidCode { remaining_attempts: 2 }))
        ));

        let verified = fixture
            .service
            .verify_code(VerifyCodeRequest {
                nhs_number: NHS.to_string(),
                validation_code: code.to_lowercase(),
            })
            .await
            .unwrap();
        assert!(verified.verified);

        let again = fixture
            .service
            .verify_code(VerifyCodeRequest {
                nhs_number: NHS.to_string(),
                validation_code: code,
            })
            .await;
        assert!(matches!(
            again,
            Err(ServiceError::Verification(VerificationError::AlreadyVerified))
        ));

        let stored = fixture.storage.find_patient_by_nhs_number(NHS).await.unwrap().unwrap();
        assert_eq!(stored.retry_count, 1);
        assert!(stored.validation_code_matched_on.is_some());
    }

    #[tokio::test]
    async fn test_expiry_and_lockout_persist() {
        let fixture = fixture();
        fixture.service.request_code(code_request(false)).await.unwrap();
        let code = last_code(&fixture);

        for _ in 0..3 {
            let _ = fixture
                .service
                .verify_code(VerifyCodeRequest {
                    nhs_number: NHS.to_string(),
                    validation_code: "XXXXX".to_string(),
                })
                .await;
        }
        let locked = fixture
            .service
            .verify_code(VerifyCodeRequest {
                nhs_number: NHS.to_string(),
                validation_code: code.clone(),
            })
            .await;
        assert!(matches!(
            locked,
            Err(ServiceError::Verification(VerificationError::RetriesExhausted))
        ));

        // A locked code is not live, so a new one can be requested without forcing
        fixture.service.request_code(code_request(false)).await.unwrap();
        let fresh = last_code(&fixture);

        fixture.clock.advance(Duration::minutes(1441));
        let expired = fixture
            .service
            .verify_code(VerifyCodeRequest {
                nhs_number: NHS.to_string(),
                validation_code: fresh,
            })
            .await;
        assert!(matches!(
            expired,
            Err(ServiceError::Verification(VerificationError::Expired))
        ));

        let stored = fixture.storage.find_patient_by_nhs_number(NHS).await.unwrap().unwrap();
        assert_eq!(stored.retry_count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_wrong_codes_use_exactly_the_allowed_attempts() {
        let fixture = fixture();
        fixture.service.request_code(code_request(false)).await.unwrap();

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let service = fixture.service.clone();
                tokio::spawn(async move {
                    service
                        .verify_code(VerifyCodeRequest {
                            nhs_number: NHS.to_string(),
                            validation_code: "XXXXX".to_string(),
                        })
                        .await
                })
            })
            .collect();

        let mut invalid = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Err(ServiceError::Verification(VerificationError::InvalidCode { .. })) => invalid += 1,
                Err(ServiceError::Verification(VerificationError::RetriesExhausted)) => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(invalid, 3);

        let stored = fixture.storage.find_patient_by_nhs_number(NHS).await.unwrap().unwrap();
        assert_eq!(stored.retry_count, 3);
    }

    #[tokio::test]
    async fn test_code_replaced_mid_attempt_is_not_matched() {
        let fixture = fixture();
        fixture.service.request_code(code_request(false)).await.unwrap();
        let stale = fixture.storage.find_patient_by_nhs_number(NHS).await.unwrap().unwrap();
        let old_code = last_code(&fixture);

        fixture.service.request_code(code_request(true)).await.unwrap();
        let outcome = fixture.service.settle_attempt(stale, &old_code, fixture.clock.now()).await.unwrap();
        assert!(matches!(outcome, Err(VerificationError::InvalidCode { remaining_attempts: 3 })));

        let stored = fixture.storage.find_patient_by_nhs_number(NHS).await.unwrap().unwrap();
        assert!(stored.validation_code_matched_on.is_none());
        assert_eq!(stored.retry_count, 0);
    }

    #[tokio::test]
    async fn test_verify_without_request() {
        let fixture = fixture();
        let result = fixture
            .service
            .verify_code(VerifyCodeRequest {
                nhs_number: NHS.to_string(),
                validation_code: "ABCDE".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::Verification(VerificationError::NoCodeIssued))
        ));
    }
}
