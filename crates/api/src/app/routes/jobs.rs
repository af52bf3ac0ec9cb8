//! Job query endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use pushline_core::{JobId, JobStatus};

use crate::app::{dto::ListJobsQuery, errors, services::AppServices};

const MAX_PAGE_SIZE: u32 = 100;

/// GET /api/v1/jobs?status=&page=&limit=
pub async fn list_jobs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListJobsQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => match JobStatus::from_str(s) {
            Ok(status) => Some(status),
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_status", e.to_string());
            }
        },
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE);

    match services.queries.list_jobs(status, page, limit).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}

/// GET /api/v1/jobs/:job_id
pub async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_id): Path<String>,
) -> axum::response::Response {
    let job_id = match JobId::from_str(&job_id) {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid job id");
        }
    };

    match services.queries.get_job(job_id).await {
        Ok(Some(job)) => (StatusCode::OK, Json(job)).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("job {job_id} not found"),
        ),
        Err(e) => errors::query_error_to_response(e),
    }
}

/// GET /api/v1/jobs/stats/summary
pub async fn stats_summary(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.queries.job_statistics().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}
