#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use config_engine::AppConfig;
use database_layer::MemoryStorage;
use mockall::predicate::always;
use notification_service::{CodeNotification, Delivery, MockNotificationBroker};
use parking_lot::Mutex;
use pds_service::{FakePdsBroker, PdsPatient};
use serde_json::Value;
use tower::ServiceExt;

use optout_server::clock::FixedClock;
use optout_server::middleware::TokenService;
use optout_server::{create_app, OptOutServer, ServerDependencies};

pub const SECRET: &str = "integration-test-secret-of-32-bytes!";
pub const JANE: &str = "9434765919";
pub const JOHN: &str = "9000000009";
pub const NO_CONTACT: &str = "4010232137";

pub struct TestApp {
    pub app: Router,
    pub server: OptOutServer,
    pub storage: MemoryStorage,
    pub clock: Arc<FixedClock>,
    pub sent: Arc<Mutex<Vec<CodeNotification>>>,
    pub tokens: TokenService,
}

fn pds_patient(nhs_number: &str, given_name: &str, email: Option<&str>) -> PdsPatient {
    PdsPatient {
        nhs_number: nhs_number.to_string(),
        title: Some("Ms".to_string()),
        given_name: given_name.to_string(),
        surname: "Smith".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 2).unwrap(),
        gender: None,
        email: email.map(str::to_string),
        phone: Some("07700900123".to_string()),
        address: Some("123 High Street, Leeds".to_string()),
        post_code: Some("LS1 4AP".to_string()),
    }
}

impl TestApp {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = SECRET.to_string();

        let storage = MemoryStorage::new();
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let sent = Arc::new(Mutex::new(Vec::new()));

        let captured = sent.clone();
        let mut notifications = MockNotificationBroker::new();
        notifications
            .expect_send_code()
            .with(always())
            .returning(move |n: &CodeNotification| {
                captured.lock().push(n.clone());
                Ok(Delivery {
                    message_id: format!("msg-{}", captured.lock().len()),
                    channel: n.channel,
                    provider: "mock",
                })
            });

        let pds = FakePdsBroker::new(vec![
            pds_patient(JANE, "Jane", Some("jane.smith@example.com")),
            pds_patient(JOHN, "John", Some("john.smith@example.com")),
            PdsPatient {
                phone: None,
                address: None,
                post_code: None,
                ..pds_patient(NO_CONTACT, "Kim", None)
            },
        ]);

        let deps = ServerDependencies::with_memory_storage(
            storage.clone(),
            Arc::new(pds),
            Arc::new(notifications),
            clock.clone(),
        );
        let server = OptOutServer::new(config, deps);
        let tokens = server.tokens.clone();

        Self {
            app: create_app(server.clone()),
            server,
            storage,
            clock,
            sent,
            tokens,
        }
    }

    pub fn admin_token(&self) -> String {
        self.tokens
            .issue("admin@example.com", &["Administrators"], Duration::minutes(10))
            .unwrap()
    }

    pub fn consumer_token(&self, client_id: &str) -> String {
        self.tokens
            .issue(client_id, &["Consumers"], Duration::minutes(10))
            .unwrap()
    }

    pub fn token_with_roles(&self, subject: &str, roles: &[&str]) -> String {
        self.tokens.issue(subject, roles, Duration::minutes(10)).unwrap()
    }

    /// The code most recently handed to the notification provider.
    pub fn last_code(&self) -> String {
        self.sent
            .lock()
            .last()
            .map(|n| n.validation_code.clone())
            .expect("no code was sent")
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, None, Some(body)).await
    }
}
