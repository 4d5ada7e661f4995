//! Shared fixtures for hearth-server integration tests
//!
//! External services are replaced by fakes: [`RecordingGateway`] records every
//! send and answers from a per-channel rule, [`FixedQuote`] returns a canned quote.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use hearth_common::db::{init_in_memory, Profile};
use hearth_server::auth::{generate_token, hash_password};
use hearth_server::config::{HearthConfig, TriggerAuth};
use hearth_server::db::events::{insert_event, EventFields};
use hearth_server::db::profiles::{insert_profile, update_profile, NewProfile, ProfileChanges};
use hearth_server::db::sessions;
use hearth_server::db::tasks::{insert_task, TaskFields};
use hearth_server::services::quotes::QuoteError;
use hearth_server::services::{
    Channel, GatewayError, MessagingGateway, PhotoStore, QuoteProvider, QuoteService,
};
use hearth_server::{build_router, AppState};

pub const TEST_PASSWORD: &str = "secret123";

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: Channel,
    pub to: String,
    pub body: String,
}

type Rule = Box<dyn Fn(Channel) -> Result<(), GatewayError> + Send + Sync>;

pub struct RecordingGateway {
    calls: Mutex<Vec<SentMessage>>,
    rule: Rule,
}

impl RecordingGateway {
    /// Every send succeeds
    pub fn ok() -> Self {
        Self::with_rule(|_| Ok(()))
    }

    /// Every send hits the daily quota
    pub fn rate_limited() -> Self {
        Self::with_rule(|_| Err(daily_limit_error()))
    }

    pub fn with_rule<F>(rule: F) -> Self
    where
        F: Fn(Channel) -> Result<(), GatewayError> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            rule: Box::new(rule),
        }
    }

    pub fn calls(&self) -> Vec<SentMessage> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send(&self, channel: Channel, to: &str, body: &str) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(SentMessage {
            channel,
            to: to.to_string(),
            body: body.to_string(),
        });
        (self.rule)(channel)
    }
}

pub fn daily_limit_error() -> GatewayError {
    GatewayError::http(429, Some(63038), "Account exceeded the 50 daily messages limit")
}

/// Quote provider with a canned answer
pub struct FixedQuote {
    pub name: &'static str,
    pub quote: Option<&'static str>,
}

#[async_trait]
impl QuoteProvider for FixedQuote {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self) -> Result<String, QuoteError> {
        self.quote
            .map(str::to_string)
            .ok_or(QuoteError::NotConfigured("TEST_KEY"))
    }
}

pub fn quote_chain(tiers: Vec<FixedQuote>) -> QuoteService {
    QuoteService::new(
        tiers
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn QuoteProvider>)
            .collect(),
    )
}

/// Router state over an in-memory database and a temporary photo folder
pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<RecordingGateway>,
    pub photo_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(RecordingGateway::ok(), quote_chain(Vec::new()), None).await
    }

    pub async fn with_gateway(gateway: RecordingGateway) -> Self {
        Self::build(gateway, quote_chain(Vec::new()), None).await
    }

    pub async fn build(
        gateway: RecordingGateway,
        quotes: QuoteService,
        trigger_auth: Option<TriggerAuth>,
    ) -> Self {
        let pool = init_in_memory().await.unwrap();
        let photo_dir = TempDir::new().unwrap();

        let mut config = HearthConfig::with_root(photo_dir.path());
        if let Some(auth) = trigger_auth {
            config.trigger_auth = auth;
        }

        let gateway = Arc::new(gateway);
        let state = AppState::new(
            pool,
            gateway.clone(),
            Arc::new(quotes),
            PhotoStore::new(photo_dir.path().join("photos")),
            config,
        );

        Self {
            state,
            gateway,
            photo_dir,
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.state.db
    }

    /// Send one request through a fresh router
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_raw(request).await
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
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

    /// Insert a member with the given role and phone
    pub async fn member(&self, name: &str, role: &str, phone: Option<&str>) -> Profile {
        insert_profile(
            self.pool(),
            &NewProfile {
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: hash_password(TEST_PASSWORD).unwrap(),
                name: name.to_string(),
                role: role.to_string(),
                gender: None,
                date_of_birth: None,
                bio: None,
                phone_number: phone.map(str::to_string),
            },
        )
        .await
        .unwrap()
    }

    pub async fn set_preferences(
        &self,
        profile: &Profile,
        notifications: bool,
        whatsapp: bool,
        sms: bool,
    ) {
        update_profile(
            self.pool(),
            &profile.id,
            ProfileChanges {
                notifications_enabled: Some(notifications),
                whatsapp_enabled: Some(whatsapp),
                sms_enabled: Some(sms),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    /// Session token for `profile`
    pub async fn token_for(&self, profile: &Profile) -> String {
        let session = generate_token();
        sessions::create_session(
            self.pool(),
            &session.token_hash,
            &profile.id,
            Utc::now() + Duration::hours(1),
        )
        .await
        .unwrap();
        session.token
    }

    pub async fn event_on(
        &self,
        creator: &Profile,
        title: &str,
        date: NaiveDate,
        time: Option<&str>,
    ) {
        insert_event(
            self.pool(),
            &EventFields {
                title: title.to_string(),
                date,
                time: time.map(str::to_string),
                notes: None,
                category: "family".to_string(),
            },
            &creator.id,
        )
        .await
        .unwrap();
    }

    pub async fn task_due(&self, creator: &Profile, title: &str, due_date: NaiveDate) {
        insert_task(
            self.pool(),
            &TaskFields {
                title: title.to_string(),
                due_date: Some(due_date),
                assigned_to: "all".to_string(),
            },
            &creator.id,
        )
        .await
        .unwrap();
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
