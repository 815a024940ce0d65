use std::sync::Arc;
use std::time::Duration;

use config_engine::{AppConfig, NotificationProvider, PdsMode, StorageBackend};
use database_layer::{
    AuditLogger, DatabaseError, DatabasePool, MemoryStorage, PgStorage, PoolConfig, Storage,
};
use notification_service::{
    CodeTemplates, LogNotificationBroker, NotificationBroker, NotificationError, NotifyConfig,
    NotifyNotificationBroker, SmtpConfig, SmtpNotificationBroker,
};
use pds_service::{FakePdsBroker, FhirPdsBroker, PdsBroker, PdsError};
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::middleware::TokenService;
use crate::services::{
    AuditService, ConsumerAdoptionService, ConsumerDecisionService, ConsumerService,
    DecisionService, DecisionTypeService, PatientCodeService, PatientSearchService, PatientService,
    ServiceContext, VerifiedDecisionService,
};
use crate::validation_code::ValidationCodes;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Storage initialisation failed: {0}")]
    Storage(#[from] DatabaseError),

    #[error("PDS initialisation failed: {0}")]
    Pds(#[from] PdsError),

    #[error("Notification initialisation failed: {0}")]
    Notification(#[from] NotificationError),
}

/// External collaborators the server is built from.
pub struct ServerDependencies {
    pub storage: Arc<dyn Storage>,
    pub audit: AuditLogger,
    pub pds: Arc<dyn PdsBroker>,
    pub notifications: Arc<dyn NotificationBroker>,
    pub clock: Arc<dyn Clock>,
}

impl ServerDependencies {
    /// In-process dependencies over one storage backend.
    pub fn with_memory_storage(
        storage: MemoryStorage,
        pds: Arc<dyn PdsBroker>,
        notifications: Arc<dyn NotificationBroker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            audit: AuditLogger::new(Arc::new(storage.clone())),
            storage: Arc::new(storage),
            pds,
            notifications,
            clock,
        }
    }
}

/// Main opt-out server state, shared by every handler
#[derive(Clone)]
pub struct OptOutServer {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn Storage>,
    pub tokens: TokenService,
    pub patients: PatientService,
    pub decision_types: DecisionTypeService,
    pub decisions: DecisionService,
    pub consumers: ConsumerService,
    pub adoptions: ConsumerAdoptionService,
    pub audits: AuditService,
    pub patient_search: PatientSearchService,
    pub patient_codes: PatientCodeService,
    pub verified_decisions: VerifiedDecisionService,
    pub consumer_decisions: ConsumerDecisionService,
}

impl OptOutServer {
    pub fn new(config: AppConfig, deps: ServerDependencies) -> Self {
        let ctx = ServiceContext::new(deps.storage.clone(), deps.audit, deps.clock);
        let codes = ValidationCodes::new(&config.validation_code);

        Self {
            tokens: TokenService::from_settings(&config.auth),
            storage: deps.storage,
            patients: PatientService::new(ctx.clone()),
            decision_types: DecisionTypeService::new(ctx.clone()),
            decisions: DecisionService::new(ctx.clone()),
            consumers: ConsumerService::new(ctx.clone()),
            adoptions: ConsumerAdoptionService::new(ctx.clone()),
            audits: AuditService::new(ctx.clone()),
            patient_search: PatientSearchService::new(ctx.clone(), deps.pds.clone()),
            patient_codes: PatientCodeService::new(
                ctx.clone(),
                deps.pds,
                deps.notifications,
                codes.clone(),
            ),
            verified_decisions: VerifiedDecisionService::new(ctx.clone(), codes),
            consumer_decisions: ConsumerDecisionService::new(ctx, config.auth.consumer_role.clone()),
            config: Arc::new(config),
        }
    }

    /// Build the server from configuration, connecting storage and the
    /// external brokers it names.
    ///
    /// # Errors
    ///
    /// Fails when the database cannot be reached or migrated, the fake PDS
    /// file cannot be read, or a notification provider cannot be built.
    pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let (storage, audit) = connect_storage(&config).await?;
        let deps = ServerDependencies {
            storage,
            audit,
            pds: build_pds(&config)?,
            notifications: build_notifications(&config)?,
            clock: Arc::new(SystemClock),
        };
        Ok(Self::new(config, deps))
    }
}

async fn connect_storage(config: &AppConfig) -> Result<(Arc<dyn Storage>, AuditLogger), StartupError> {
    let settings = &config.database;
    match settings.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            let storage = MemoryStorage::new();
            Ok((
                Arc::new(storage.clone()),
                AuditLogger::new(Arc::new(storage)),
            ))
        }
        StorageBackend::Postgres => {
            let pool_config = PoolConfig {
                max_connections: settings.max_connections,
                min_connections: settings.min_connections,
                acquire_timeout: Duration::from_secs(settings.acquire_timeout_secs),
            };
            let pool = DatabasePool::new(&settings.url, &pool_config).await?;
            if settings.run_migrations {
                pool.run_migrations().await?;
            }
            let storage = PgStorage::new(pool);
            Ok((
                Arc::new(storage.clone()),
                AuditLogger::new(Arc::new(storage)),
            ))
        }
    }
}

fn build_pds(config: &AppConfig) -> Result<Arc<dyn PdsBroker>, StartupError> {
    let settings = &config.pds;
    let broker: Arc<dyn PdsBroker> = match settings.mode {
        PdsMode::Fhir => Arc::new(FhirPdsBroker::new(
            &settings.base_url,
            settings.api_key.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?),
        PdsMode::Fake => match &settings.fake_patients_file {
            Some(path) => Arc::new(FakePdsBroker::from_file(path)?),
            None => {
                warn!("Fake PDS mode without a patients file; every lookup will miss");
                Arc::new(FakePdsBroker::new(Vec::new()))
            }
        },
    };
    info!(mode = ?settings.mode, "PDS broker ready");
    Ok(broker)
}

fn build_notifications(config: &AppConfig) -> Result<Arc<dyn NotificationBroker>, StartupError> {
    let settings = &config.notification;
    let broker: Arc<dyn NotificationBroker> = match settings.provider {
        NotificationProvider::Smtp => Arc::new(SmtpNotificationBroker::new(
            SmtpConfig {
                host: settings.smtp.host.clone(),
                port: settings.smtp.port,
                username: settings.smtp.username.clone(),
                password: settings.smtp.password.clone(),
                use_tls: settings.smtp.use_tls,
                from_email: settings.from_email.clone(),
                from_name: settings.from_name.clone(),
            },
            CodeTemplates::new()?,
        )),
        NotificationProvider::Notify => Arc::new(NotifyNotificationBroker::new(
            NotifyConfig {
                base_url: settings.notify.base_url.clone(),
                api_key: settings.notify.api_key.clone(),
                email_template_id: settings.notify.email_template_id.clone(),
                sms_template_id: settings.notify.sms_template_id.clone(),
                letter_template_id: settings.notify.letter_template_id.clone(),
            },
            Duration::from_secs(config.server.request_timeout_secs),
        )?),
        NotificationProvider::Log => {
            warn!("Validation codes will be logged, not delivered");
            Arc::new(LogNotificationBroker::new(CodeTemplates::new()?))
        }
    };
    info!(provider = ?settings.provider, "Notification broker ready");
    Ok(broker)
}
