//! Durable job/event storage.
//!
//! The store is the authoritative record. Both writes the lifecycle engine
//! performs (create on submit, update on complete/fail) carry the job row and
//! its audit event together and must commit them in one transaction: a reader
//! must never observe a job without its corresponding event.

mod memory;
mod postgres;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use pushline_core::{EventLog, Job, JobId, JobStatus};

pub use memory::InMemoryJobStore;
pub use postgres::PostgresJobStore;

/// Storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage error: {0}")]
    Storage(String),
}

/// One page of jobs plus the total count over the same status filter.
#[derive(Debug, Clone)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: i64,
}

/// Raw aggregates over all jobs. Derived figures (success rate) are computed
/// by the query service so both store backends share one formula.
#[derive(Debug, Clone, Default)]
pub struct JobAggregates {
    pub total_jobs: i64,
    pub by_status: BTreeMap<String, i64>,
    /// Mean duration over completed jobs with both `started_at` and
    /// `completed_at` set.
    pub avg_duration_seconds: Option<f64>,
    pub total_retries: i64,
}

/// Transactional create/update over jobs and their audit trail.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job and its audit event atomically.
    async fn create_job(&self, job: &Job, event: &EventLog) -> Result<(), StoreError>;

    /// Persist an updated job row and its audit event atomically.
    /// Fails with [`StoreError::NotFound`] if the job was never created.
    async fn update_job(&self, job: &Job, event: &EventLog) -> Result<(), StoreError>;

    async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, StoreError>;

    /// Page through jobs ordered by `created_at` descending.
    /// `page` is 1-based; the offset is `(page - 1) * limit`.
    async fn list_jobs(
        &self,
        status: Option<JobStatus>,
        page: u32,
        limit: u32,
    ) -> Result<JobPage, StoreError>;

    async fn aggregates(&self) -> Result<JobAggregates, StoreError>;

    /// Audit events for one job, oldest first.
    async fn events_for_job(&self, job_id: JobId) -> Result<Vec<EventLog>, StoreError>;

    /// Connectivity probe for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}
