//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (store, cache, lifecycle, queries)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .route("/status", get(routes::system::status))
        .route("/readiness", get(routes::system::readiness))
        .route("/cache/stats", get(routes::system::cache_stats))
        .route("/pubsub/push", post(routes::ingest::push))
        .nest("/api/v1", routes::api_router())
        .layer(Extension(services))
}
