//! Audit-trail inspection.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use pushline_core::JobId;

use crate::app::{errors, services::AppServices};

/// GET /api/v1/events/:job_id — ordered event list for one job.
pub async fn job_events(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_id): Path<String>,
) -> axum::response::Response {
    let job_id = match JobId::from_str(&job_id) {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid job id");
        }
    };

    match services.queries.job_events(job_id).await {
        Ok(events) if events.is_empty() => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no events found for job {job_id}"),
        ),
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}
