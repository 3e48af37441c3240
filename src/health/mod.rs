/*!
 * # Health Check Module
 *
 * - Liveness (`/health`): process is up, with version and uptime
 * - Readiness (`/health/ready`): database answers a ping
 * - `/ping`: plain `{"message": "Pong"}` for load balancers
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DatabaseConnection>,
    pub start_time: SystemTime,
}

impl HealthState {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self {
            db_pool,
            start_time: SystemTime::now(),
        }
    }

    pub fn uptime(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs()
    }
}

/// Liveness; never touches the database
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Health check endpoint called");

    Json(json!({
        "status": HealthStatus::Up,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.uptime(),
        "timestamp": Utc::now(),
    }))
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let database = match crate::db::check_connection(&state.db_pool).await {
        Ok(()) => HealthStatus::Up,
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            HealthStatus::Down
        }
    };

    let status_code = match database {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status_code,
        Json(json!({
            "ready": database == HealthStatus::Up,
            "database": database,
            "timestamp": Utc::now(),
        })),
    )
}

pub async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "Pong" }))
}

/// Creates router with health check endpoints
pub fn health_routes(db_pool: Arc<DatabaseConnection>) -> Router {
    let health_state = Arc::new(HealthState::new(db_pool));

    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/ping", get(ping))
        .with_state(health_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn readiness_reports_down_without_database() {
        let app = health_routes(Arc::new(DatabaseConnection::Disconnected));

        let response = app
            .clone()
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
