//! Common test utilities for integration tests
//!
//! - Migrated test database from `DATABASE_URL`
//! - Two seeded organisations, each with an organisor and agents
//! - A recording notifier in place of the outbox
//! - Request helpers driving the router directly
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use leadbook_api::{
    app::{build_router, AppState},
    config::Config,
};
use leadbook_shared::{
    auth::jwt::issue_pair,
    db::migrations::run_migrations,
    models::{
        agent::{Agent, CreateAgent},
        lead::{CreateLead, Lead},
        notification::NewNotification,
        organisation::{CreateOrganisation, Organisation},
        user::{CreateUser, User},
    },
    notify::{Notifier, NotifyError},
    visibility::LeadFilter,
};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use tower::Service as _;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Notifier that keeps every message in memory
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NewNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<NewNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: NewNotification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// A seeded user with a valid access token
pub struct Member {
    pub user: User,
    pub token: String,
}

/// A seeded agent
pub struct SeededAgent {
    pub member: Member,
    pub agent: Agent,
}

/// A seeded organisation
pub struct SeededOrg {
    pub organisation: Organisation,
    pub organisor: Member,
    pub agents: Vec<SeededAgent>,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub notifier: Arc<RecordingNotifier>,
    /// Two agents
    pub org_a: SeededOrg,
    /// One agent
    pub org_b: SeededOrg,
}

fn test_config() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(JWT_SECRET.to_string()),
        "NOTIFY_FROM" => Some("leads@example.com".to_string()),
        "NOTIFY_RECIPIENTS" => Some("sales@example.com,owner@example.com".to_string()),
        other => std::env::var(other).ok(),
    })
}

async fn seed_user(db: &PgPool, label: &str, is_organisor: bool) -> anyhow::Result<Member> {
    let user = User::create(
        db,
        CreateUser {
            email: format!("{label}-{}@example.com", Uuid::new_v4()),
            first_name: label.to_string(),
            last_name: "Test".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            is_organisor,
        },
    )
    .await?;

    let token = issue_pair(user.id, JWT_SECRET)?.access_token;
    Ok(Member { user, token })
}

async fn seed_org(db: &PgPool, name: &str, agent_count: usize) -> anyhow::Result<SeededOrg> {
    let organisor = seed_user(db, &format!("{name}-owner"), true).await?;
    let organisation = Organisation::create(
        db,
        CreateOrganisation {
            owner_id: organisor.user.id,
            name: format!("{name} {}", Uuid::new_v4()),
        },
    )
    .await?;

    let mut agents = Vec::with_capacity(agent_count);
    for i in 0..agent_count {
        let member = seed_user(db, &format!("{name}-agent{i}"), false).await?;
        let agent = Agent::create(
            db,
            CreateAgent {
                user_id: member.user.id,
                organisation_id: organisation.id,
            },
        )
        .await?;
        agents.push(SeededAgent { member, agent });
    }

    Ok(SeededOrg {
        organisation,
        organisor,
        agents,
    })
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let config = test_config()?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let org_a = seed_org(&db, "alpha", 2).await?;
        let org_b = seed_org(&db, "beta", 1).await?;

        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::with_notifier(db.clone(), config.clone(), notifier.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            notifier,
            org_a,
            org_b,
        })
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for empty bodies)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Inserts a lead directly, optionally assigned
    pub async fn seed_lead(
        &self,
        org: &SeededOrg,
        first_name: &str,
        agent: Option<&SeededAgent>,
    ) -> anyhow::Result<Lead> {
        let lead = Lead::create(
            &self.db,
            CreateLead {
                organisation_id: org.organisation.id,
                first_name: first_name.to_string(),
                last_name: "Lead".to_string(),
                age: 30,
                description: String::new(),
                email: None,
                phone_number: None,
            },
        )
        .await?;

        let Some(agent) = agent else {
            return Ok(lead);
        };

        let filter = LeadFilter::organisation(org.organisation.id);
        let assigned = Lead::assign_agent(&self.db, &filter, lead.id, agent.agent.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("seeded lead vanished"))?;
        Ok(assigned)
    }

    /// Reads a lead bypassing any caller scope
    pub async fn load_lead(&self, org: &SeededOrg, id: Uuid) -> anyhow::Result<Option<Lead>> {
        let lead = Lead::find(&self.db, &LeadFilter::organisation(org.organisation.id), id).await?;
        Ok(lead)
    }

    /// Deletes everything seeded for this context
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for org in [&self.org_a, &self.org_b] {
            for agent in &org.agents {
                User::delete(&self.db, agent.member.user.id).await?;
            }
            // Cascades to the organisation and its leads and categories
            User::delete(&self.db, org.organisor.user.id).await?;
        }
        Ok(())
    }
}

/// Waits for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout_secs: u64) -> anyhow::Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_secs);

    loop {
        if condition().await {
            return Ok(());
        }

        if start.elapsed() > timeout {
            anyhow::bail!("Condition not met within {} seconds", timeout_secs);
        }

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

/// IDs out of a JSON array of objects
pub fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
