//! The durable job record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::id::JobId;
use crate::state::{JobSignal, JobStatus, TransitionError};

/// Default retry budget for a job.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// One unit of asynchronous work, tracked from receipt to a terminal state.
///
/// Rows are append-only from the caller's perspective: jobs are never deleted,
/// and all mutation goes through [`Job::complete`] / [`Job::fail`], which route
/// the status change through the transition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// System-generated unique identifier, immutable.
    pub job_id: JobId,
    /// Identifier supplied by the upstream transport. Not unique across
    /// redeliveries: each delivery attempt gets its own job row.
    pub message_id: Option<String>,
    pub status: JobStatus,
    /// Opaque structured input.
    pub payload: Option<JsonValue>,
    /// Opaque structured output; present only when completed.
    pub result: Option<JsonValue>,
    /// Present only for failed / dead-lettered jobs.
    pub error_message: Option<String>,
    /// Monotonically non-decreasing.
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Provenance tag (e.g. "pubsub").
    pub source: Option<String>,
    /// Threads all records produced by one ingestion request.
    pub correlation_id: Option<String>,
}

impl Job {
    /// Create a job for a freshly received message.
    ///
    /// The job starts directly in `processing` — an accepted message is never
    /// parked in `pending` — so `started_at` is set at construction.
    pub fn begin(
        message_id: Option<String>,
        payload: Option<JsonValue>,
        source: Option<String>,
        correlation_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            message_id,
            status: JobStatus::Processing,
            payload,
            result: None,
            error_message: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            created_at: now,
            updated_at: now,
            started_at: Some(now),
            completed_at: None,
            source,
            correlation_id,
        }
    }

    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Record a successful outcome.
    ///
    /// No field is touched unless the transition is legal.
    pub fn complete(&mut self, result: JsonValue) -> Result<(), TransitionError> {
        let next = self.status.apply(JobSignal::Succeed)?;
        let now = Utc::now();
        self.status = next;
        self.result = Some(result);
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Record a failed delivery attempt.
    ///
    /// Increments the retry count; when the new value reaches the retry budget
    /// the job dead-letters, otherwise it is marked failed. Returns the
    /// resulting status. No field is touched unless the transition is legal.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<JobStatus, TransitionError> {
        let attempts = self.retry_count + 1;
        let next = self.status.apply(JobSignal::Fail {
            budget_exhausted: attempts >= self.max_retries,
        })?;
        let now = Utc::now();
        self.status = next;
        self.retry_count = attempts;
        self.error_message = Some(error.into());
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(next)
    }

    /// Wall-clock duration of a finished job, when both bounds are known.
    pub fn duration_seconds(&self) -> Option<f64> {
        let started = self.started_at?;
        let completed = self.completed_at?;
        let millis = (completed - started).num_milliseconds();
        Some(millis as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> Job {
        Job::begin(
            Some("msg-1".into()),
            Some(json!({"text": "hello"})),
            Some("pubsub".into()),
            Some("corr-1".into()),
        )
    }

    #[test]
    fn begins_in_processing_with_started_at() {
        let j = job();
        assert_eq!(j.status, JobStatus::Processing);
        assert!(j.started_at.is_some());
        assert!(j.completed_at.is_none());
        assert_eq!(j.retry_count, 0);
        assert_eq!(j.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn complete_sets_result_and_completed_at() {
        let mut j = job();
        j.complete(json!({"payload_length": 5})).unwrap();
        assert_eq!(j.status, JobStatus::Completed);
        assert_eq!(j.result, Some(json!({"payload_length": 5})));
        assert!(j.completed_at.is_some());
    }

    #[test]
    fn fail_under_budget_marks_failed() {
        let mut j = job();
        let status = j.fail("boom").unwrap();
        assert_eq!(status, JobStatus::Failed);
        assert_eq!(j.retry_count, 1);
        assert_eq!(j.error_message.as_deref(), Some("boom"));
        assert!(j.completed_at.is_some());
    }

    #[test]
    fn third_failure_dead_letters() {
        let mut j = job();
        assert_eq!(j.fail("1").unwrap(), JobStatus::Failed);
        assert_eq!(j.fail("2").unwrap(), JobStatus::Failed);
        assert_eq!(j.fail("3").unwrap(), JobStatus::DeadLetter);
        assert_eq!(j.retry_count, 3);
        // Never regresses out of dead_letter.
        assert!(j.fail("4").is_err());
        assert_eq!(j.status, JobStatus::DeadLetter);
        assert_eq!(j.retry_count, 3);
    }

    #[test]
    fn zero_budget_dead_letters_immediately() {
        let mut j = job().with_max_retries(0);
        assert_eq!(j.fail("boom").unwrap(), JobStatus::DeadLetter);
    }

    #[test]
    fn completed_job_rejects_further_transitions() {
        let mut j = job();
        j.complete(json!({})).unwrap();
        let before = j.clone();
        assert!(j.fail("late failure").is_err());
        // Rejected transitions leave the record untouched.
        assert_eq!(j, before);
    }

    #[test]
    fn duration_requires_both_bounds() {
        let mut j = job();
        assert!(j.duration_seconds().is_none());
        j.complete(json!({})).unwrap();
        assert!(j.duration_seconds().unwrap() >= 0.0);
    }
}
