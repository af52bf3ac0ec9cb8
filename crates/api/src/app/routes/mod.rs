use axum::{routing::get, Router};

pub mod events;
pub mod ingest;
pub mod jobs;
pub mod system;

/// Router for the `/api/v1` query surface.
pub fn api_router() -> Router {
    Router::new()
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/stats/summary", get(jobs::stats_summary))
        .route("/jobs/:job_id", get(jobs::get_job))
        .route("/events/:job_id", get(events::job_events))
}
