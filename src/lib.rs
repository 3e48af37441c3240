//! Storefront API Library
//!
//! Product catalog, per-warehouse inventory with optimistic locking, and cart
//! pricing with promotion codes.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config: Arc::new(config),
            services,
        }
    }
}

/// Every `/api/v1` route
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::commerce::products_routes())
        .merge(handlers::commerce::carts_routes())
        .merge(handlers::inventory::inventory_routes())
}

/// Full application router without CORS, which the binary adds from config
pub fn app_router(state: AppState) -> Router {
    let health = health::health_routes(state.db.clone());

    Router::<AppState>::new()
        .route("/", get(|| async { "storefront-api up" }))
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
        .merge(health)
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
}
