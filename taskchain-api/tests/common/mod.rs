//! Common test utilities for HTTP-level tests
//!
//! The router runs over a `MemoryStore`, so task and scenario endpoints need
//! no external services. The database pool is created lazily and never
//! connected; only account and health endpoints would touch it.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;
use taskchain_api::app::{build_router, AppState};
use taskchain_api::config::Config;
use taskchain_shared::auth::jwt::{create_token, Claims, TokenType};
use taskchain_shared::store::MemoryStore;
use taskchain_shared::workflow::WorkflowService;
use tower::Service as _;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

/// Test context containing the router and its backing services
pub struct TestContext {
    pub app: axum::Router,
    pub workflow: WorkflowService,
    pub config: Config,
}

impl TestContext {
    /// Creates a router over a fresh in-memory store
    pub fn new() -> anyhow::Result<Self> {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://localhost:5432/taskchain_test"),
            ("JWT_SECRET", TEST_JWT_SECRET),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))?;

        let db = PgPoolOptions::new().connect_lazy(&config.database.url)?;
        let workflow = WorkflowService::new(Arc::new(MemoryStore::new()));
        let state = AppState::new(db, workflow.clone(), config.clone());

        Ok(Self {
            app: build_router(state),
            workflow,
            config,
        })
    }

    /// Mints an access token for `username`
    pub fn token_for(&self, username: &str) -> String {
        let claims = Claims::new(Uuid::new_v4(), username, TokenType::Access);
        create_token(&claims, TEST_JWT_SECRET).unwrap()
    }

    /// Sends a request as `username` (or anonymously) and returns status and JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        username: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(username) = username {
            builder = builder.header("authorization", format!("Bearer {}", self.token_for(username)));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        split(response).await
    }
}

async fn split(response: Response<Body>) -> (StatusCode, Value) {
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
