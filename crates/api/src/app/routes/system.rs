//! Liveness, readiness and cache introspection.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::app::{errors, services::AppServices};

/// GET /health — process liveness, no dependency checks.
pub async fn health() -> axum::response::Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "pushline",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now(),
        })),
    )
        .into_response()
}

/// GET /status — dependency health report, always 200.
pub async fn status(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let store_ok = services.store.ping().await.is_ok();
    let cache_ok = services.cache.ping().await;

    let overall = if store_ok && cache_ok {
        "healthy"
    } else {
        "degraded"
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": overall,
            "components": {
                "database": if store_ok { "up" } else { "down" },
                "cache": if cache_ok { "up" } else { "down" },
            },
            "timestamp": Utc::now(),
        })),
    )
        .into_response()
}

/// GET /readiness — 503 until the store answers. The cache is optional by
/// contract and never gates readiness.
pub async fn readiness(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "ready": true }))).into_response(),
        Err(e) => errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "not_ready",
            format!("store unavailable: {e}"),
        ),
    }
}

/// GET /cache/stats — hit/miss counters, 503 when the cache backend is down.
pub async fn cache_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let stats = services.cache.stats();
    if !stats.connected {
        return errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "cache_unavailable",
            "cache backend is not connected",
        );
    }
    (StatusCode::OK, Json(stats)).into_response()
}
