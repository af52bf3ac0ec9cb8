//! In-memory job store for tests and local development.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use pushline_core::{EventLog, Job, JobId, JobStatus};

use super::{JobAggregates, JobPage, JobStore, StoreError};

/// [`JobStore`] twin backed by process memory. Mirrors the Postgres
/// implementation's semantics (ordering, counts, not-found on update).
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    events: RwLock<Vec<EventLog>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_job(&self, job: &Job, event: &EventLog) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(&job.job_id) {
            return Err(StoreError::Storage(format!(
                "job already exists: {}",
                job.job_id
            )));
        }
        jobs.insert(job.job_id, job.clone());
        self.events.write().unwrap().push(event.clone());
        Ok(())
    }

    async fn update_job(&self, job: &Job, event: &EventLog) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().unwrap();
        if !jobs.contains_key(&job.job_id) {
            return Err(StoreError::NotFound(job.job_id));
        }
        jobs.insert(job.job_id, job.clone());
        self.events.write().unwrap().push(event.clone());
        Ok(())
    }

    async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.read().unwrap().get(&job_id).cloned())
    }

    async fn list_jobs(
        &self,
        status: Option<JobStatus>,
        page: u32,
        limit: u32,
    ) -> Result<JobPage, StoreError> {
        let jobs = self.jobs.read().unwrap();
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|j| status.map_or(true, |s| j.status == s))
            .cloned()
            .collect();

        // created_at desc; job_id breaks sub-millisecond ties (UUIDv7 is
        // time-ordered).
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.job_id.as_uuid().cmp(a.job_id.as_uuid()))
        });

        let total = matching.len() as i64;
        let offset = page.saturating_sub(1) as usize * limit as usize;
        let jobs = matching
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Ok(JobPage { jobs, total })
    }

    async fn aggregates(&self) -> Result<JobAggregates, StoreError> {
        let jobs = self.jobs.read().unwrap();

        let mut by_status: BTreeMap<String, i64> = BTreeMap::new();
        let mut total_retries = 0i64;
        let mut durations = Vec::new();

        for job in jobs.values() {
            *by_status.entry(job.status.as_str().to_string()).or_insert(0) += 1;
            total_retries += i64::from(job.retry_count);
            if job.status == JobStatus::Completed {
                if let Some(seconds) = job.duration_seconds() {
                    durations.push(seconds);
                }
            }
        }

        let avg_duration_seconds = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<f64>() / durations.len() as f64)
        };

        Ok(JobAggregates {
            total_jobs: jobs.len() as i64,
            by_status,
            avg_duration_seconds,
            total_retries,
        })
    }

    async fn events_for_job(&self, job_id: JobId) -> Result<Vec<EventLog>, StoreError> {
        let mut events: Vec<EventLog> = self
            .events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.job_id == Some(job_id))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
