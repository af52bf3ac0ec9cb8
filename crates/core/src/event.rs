//! Immutable audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::id::{EventId, JobId};

/// Event type tags written by the lifecycle engine.
pub mod event_types {
    pub const MESSAGE_RECEIVED: &str = "message.received";
    pub const JOB_COMPLETED: &str = "job.completed";
    pub const JOB_FAILED: &str = "job.failed";
    pub const JOB_DEAD_LETTERED: &str = "job.dead_lettered";
}

/// One audit entry. Created once per significant transition, never mutated
/// or deleted. `job_id` is a lookup reference, not an ownership edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub event_id: EventId,
    pub event_type: String,
    pub job_id: Option<JobId>,
    pub data: Option<JsonValue>,
    pub metadata: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<String>,
}

impl EventLog {
    pub fn new(
        event_type: impl Into<String>,
        job_id: Option<JobId>,
        data: Option<JsonValue>,
        metadata: Option<JsonValue>,
        correlation_id: Option<String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            job_id,
            data,
            metadata,
            timestamp: Utc::now(),
            correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_carries_job_reference_and_correlation() {
        let job_id = JobId::new();
        let e = EventLog::new(
            event_types::MESSAGE_RECEIVED,
            Some(job_id),
            Some(json!({"message_id": "m-1"})),
            None,
            Some("corr-1".into()),
        );
        assert_eq!(e.event_type, "message.received");
        assert_eq!(e.job_id, Some(job_id));
        assert_eq!(e.correlation_id.as_deref(), Some("corr-1"));
    }
}
