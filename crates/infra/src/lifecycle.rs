//! The job lifecycle engine.
//!
//! Drives a job from receipt to a terminal state. There is no in-process
//! retry loop: each inbound delivery is classified exactly once, and retrying
//! is the upstream transport's job (a redelivery produces a fresh job row).
//!
//! Ordering contract: the job row and its audit event are committed in one
//! store transaction before any cache mutation is attempted, so a reader can
//! never observe a cached job without a committed event trail.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use tracing::{info, warn};

use pushline_core::{event_types, EventLog, Job, JobStatus, TransitionError};

use crate::cache::{self, CacheKey, CacheProvider};
use crate::store::{JobStore, StoreError};

/// Lifecycle operation failure. Store errors are fatal to the request;
/// transition errors indicate a caller bug (driving a terminal job).
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// State machine driver over the durable store and best-effort cache.
///
/// Constructed once at startup with injected handles; holds no global state.
pub struct JobLifecycle {
    store: Arc<dyn JobStore>,
    cache: Arc<dyn CacheProvider>,
    source: String,
    max_retries: i32,
    job_ttl: Duration,
}

impl JobLifecycle {
    pub fn new(
        store: Arc<dyn JobStore>,
        cache: Arc<dyn CacheProvider>,
        source: impl Into<String>,
        max_retries: i32,
        job_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            source: source.into(),
            max_retries,
            job_ttl,
        }
    }

    /// Accept one inbound message: allocate the job (directly in
    /// `processing`) and its `message.received` audit event, committed in one
    /// transaction. The returned job is the handle for `complete`/`fail`.
    pub async fn submit(
        &self,
        message_id: Option<String>,
        payload: Option<JsonValue>,
        attributes: Option<JsonValue>,
        correlation_id: Option<String>,
    ) -> Result<Job, LifecycleError> {
        let job = Job::begin(
            message_id.clone(),
            payload,
            Some(self.source.clone()),
            correlation_id.clone(),
        )
        .with_max_retries(self.max_retries);

        let event = EventLog::new(
            event_types::MESSAGE_RECEIVED,
            Some(job.job_id),
            Some(json!({ "message_id": message_id })),
            attributes,
            correlation_id,
        );

        self.store.create_job(&job, &event).await?;
        info!(job_id = %job.job_id, correlation_id = ?job.correlation_id, "job submitted");
        Ok(job)
    }

    /// Record a successful outcome, then write the final snapshot through to
    /// the cache. List caches are left alone: they expire by TTL.
    pub async fn complete(&self, mut job: Job, result: JsonValue) -> Result<Job, LifecycleError> {
        job.complete(result)?;

        let event = EventLog::new(
            event_types::JOB_COMPLETED,
            Some(job.job_id),
            Some(json!({ "duration_seconds": job.duration_seconds() })),
            None,
            job.correlation_id.clone(),
        );
        self.store.update_job(&job, &event).await?;

        // Write-through of the final state; best-effort by contract.
        cache::set_json(
            self.cache.as_ref(),
            &CacheKey::job(job.job_id),
            &job,
            Some(self.job_ttl),
        )
        .await;

        info!(job_id = %job.job_id, "job completed");
        Ok(job)
    }

    /// Record a failed delivery attempt. The incremented retry count decides
    /// between `failed` and `dead_letter`. The job's cache entry is evicted
    /// rather than updated: a transient error state must not be served as if
    /// final, so the next read goes to the store.
    pub async fn fail(&self, mut job: Job, error: impl Into<String>) -> Result<Job, LifecycleError> {
        let error = error.into();
        let status = job.fail(error.clone())?;

        let event_type = match status {
            JobStatus::DeadLetter => event_types::JOB_DEAD_LETTERED,
            _ => event_types::JOB_FAILED,
        };
        let event = EventLog::new(
            event_type,
            Some(job.job_id),
            Some(json!({ "error": error, "retry_count": job.retry_count })),
            None,
            job.correlation_id.clone(),
        );
        self.store.update_job(&job, &event).await?;

        self.cache.delete(&CacheKey::job(job.job_id)).await;

        if status == JobStatus::DeadLetter {
            warn!(job_id = %job.job_id, retry_count = job.retry_count, "job dead-lettered");
        } else {
            info!(job_id = %job.job_id, retry_count = job.retry_count, "job failed");
        }
        Ok(job)
    }
}
