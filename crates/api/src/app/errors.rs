use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pushline_infra::{LifecycleError, QueryError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Lifecycle failures reaching the HTTP layer are infrastructure errors:
/// processing-outcome failures were already folded into the job state.
pub fn lifecycle_error_to_response(err: LifecycleError) -> axum::response::Response {
    match err {
        LifecycleError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        LifecycleError::Transition(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "illegal_transition",
            e.to_string(),
        ),
    }
}

pub fn query_error_to_response(err: QueryError) -> axum::response::Response {
    match err {
        QueryError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}
