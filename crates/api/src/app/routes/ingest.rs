//! Push ingestion: one message per request.
//!
//! Acknowledgement policy: 200 once a terminal job state is durably
//! recorded — including when the processing function failed, because a
//! failed job is a valid business outcome, not a transport error. Only
//! malformed envelopes (400) and infrastructure failures (500) are non-200.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use base64::Engine as _;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::app::{dto::PushMessage, errors, services::AppServices};

pub async fn push(
    Extension(services): Extension<Arc<AppServices>>,
    body: Option<Json<JsonValue>>,
) -> axum::response::Response {
    let Some(Json(envelope)) = body else {
        return errors::json_error(StatusCode::BAD_REQUEST, "bad_request", "no JSON body");
    };

    let Some(message_value) = envelope.get("message") else {
        return errors::json_error(StatusCode::BAD_REQUEST, "bad_request", "no message field");
    };

    let message: PushMessage = match serde_json::from_value(message_value.clone()) {
        Ok(message) => message,
        Err(e) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "bad_request",
                format!("malformed message: {e}"),
            );
        }
    };

    let text = match &message.data {
        Some(data) => {
            let decoded = match base64::engine::general_purpose::STANDARD.decode(data) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "bad_request",
                        format!("data is not valid base64: {e}"),
                    );
                }
            };
            match String::from_utf8(decoded) {
                Ok(text) => text,
                Err(e) => {
                    return errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "bad_request",
                        format!("data is not valid UTF-8: {e}"),
                    );
                }
            }
        }
        None => String::new(),
    };

    // One correlation id threads the job and all its audit events.
    let correlation_id = Uuid::now_v7().to_string();
    let payload = json!({ "text": text });
    let attributes = message
        .attributes
        .as_ref()
        .and_then(|attrs| serde_json::to_value(attrs).ok());

    let job = match services
        .lifecycle
        .submit(
            message.message_id.clone(),
            Some(payload.clone()),
            attributes,
            Some(correlation_id),
        )
        .await
    {
        Ok(job) => job,
        Err(e) => return errors::lifecycle_error_to_response(e),
    };
    let job_id = job.job_id;

    let outcome = match services.processor.process(&payload).await {
        Ok(result) => services.lifecycle.complete(job, result).await,
        Err(e) => services.lifecycle.fail(job, e.to_string()).await,
    };

    match outcome {
        Ok(job) => (
            StatusCode::OK,
            Json(json!({
                "status": "processed",
                "job_id": job.job_id,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "failed to record job outcome");
            errors::lifecycle_error_to_response(e)
        }
    }
}
