#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use storefront_api::{config::AppConfig, db, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

/// SKUs inserted by the seed migration; each has a default-warehouse row with 50 available
pub const SEEDED_SKUS: [&str; 9] = [
    "WAFFLE-001",
    "CREME-001",
    "MACARON-001",
    "TIRAMISU-001",
    "BAKLAVA-001",
    "PIE-001",
    "CAKE-001",
    "BROWNIE-001",
    "PANNA-001",
];

/// Helper harness for spinning up an application backed by a throwaway SQLite file.
///
/// A single pooled connection keeps SQLite writers serialized, so concurrent
/// tests observe the database's own conditional-update semantics.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh, migrated and seeded database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = db_dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = storefront_api::app_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
        }
    }

    pub fn db(&self) -> Arc<DatabaseConnection> {
        self.state.db.clone()
    }

    /// Sends a request through the full router and returns the status and JSON body
    /// (`Value::Null` when the body is empty or not JSON).
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}

/// Parses a decimal that may be serialized as a JSON string or number
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}
