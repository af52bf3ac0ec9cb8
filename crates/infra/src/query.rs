//! Read side: job-by-id, paginated lists, aggregate statistics.
//!
//! Single-job reads are read-through with the same TTL class the lifecycle
//! engine writes through with, so both paths serve identical snapshots.
//! List and aggregate entries are never proactively invalidated: their
//! staleness bound is their TTL, a documented tradeoff.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pushline_core::{EventLog, Job, JobId, JobStatus};

use crate::cache::{self, CacheKey, CacheProvider};
use crate::config::CacheConfig;
use crate::store::{JobStore, StoreError};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One page of jobs with pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListPage {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub jobs: Vec<Job>,
}

/// Aggregate statistics over all jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatistics {
    pub total_jobs: i64,
    pub by_status: BTreeMap<String, i64>,
    pub avg_duration_seconds: Option<f64>,
    /// `completed / (completed + failed) * 100`, 0.0 when nothing finished,
    /// rounded to two decimals.
    pub success_rate: f64,
    pub total_retries: i64,
}

/// Cache-accelerated read service over the job store.
pub struct JobQueryService {
    store: Arc<dyn JobStore>,
    cache: Arc<dyn CacheProvider>,
    ttls: CacheConfig,
}

impl JobQueryService {
    pub fn new(store: Arc<dyn JobStore>, cache: Arc<dyn CacheProvider>, ttls: CacheConfig) -> Self {
        Self { store, cache, ttls }
    }

    /// Read-through lookup by unique job id.
    pub async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, QueryError> {
        let key = CacheKey::job(job_id);

        if let Some(job) = cache::get_json::<Job>(self.cache.as_ref(), &key).await {
            return Ok(Some(job));
        }

        let Some(job) = self.store.get_job(job_id).await? else {
            return Ok(None);
        };

        cache::set_json(self.cache.as_ref(), &key, &job, Some(self.ttls.ttl_job)).await;
        Ok(Some(job))
    }

    /// Paginated job list; the cache key is the exact filter/pagination
    /// tuple. Page 1-based, newest first.
    pub async fn list_jobs(
        &self,
        status: Option<JobStatus>,
        page: u32,
        limit: u32,
    ) -> Result<JobListPage, QueryError> {
        let key = CacheKey::job_list(status.map(|s| s.as_str()), page, limit);

        if let Some(cached) = cache::get_json::<JobListPage>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let page_result = self.store.list_jobs(status, page, limit).await?;
        let result = JobListPage {
            total: page_result.total,
            page,
            limit,
            jobs: page_result.jobs,
        };

        cache::set_json(
            self.cache.as_ref(),
            &key,
            &result,
            Some(self.ttls.ttl_job_list),
        )
        .await;
        Ok(result)
    }

    /// Aggregate statistics, cached under a short aggregate TTL.
    pub async fn job_statistics(&self) -> Result<JobStatistics, QueryError> {
        let key = CacheKey::aggregation("job_stats", "all");

        if let Some(cached) = cache::get_json::<JobStatistics>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let agg = self.store.aggregates().await?;

        let completed = agg.by_status.get("completed").copied().unwrap_or(0);
        let failed = agg.by_status.get("failed").copied().unwrap_or(0);
        let finished = completed + failed;
        let success_rate = if finished > 0 {
            let rate = completed as f64 / finished as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };

        let stats = JobStatistics {
            total_jobs: agg.total_jobs,
            by_status: agg.by_status,
            avg_duration_seconds: agg.avg_duration_seconds,
            success_rate,
            total_retries: agg.total_retries,
        };

        cache::set_json(
            self.cache.as_ref(),
            &key,
            &stats,
            Some(self.ttls.ttl_aggregations),
        )
        .await;
        Ok(stats)
    }

    /// Audit trail for one job, oldest first. Not cached.
    pub async fn job_events(&self, job_id: JobId) -> Result<Vec<EventLog>, QueryError> {
        Ok(self.store.events_for_job(job_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    use crate::cache::InMemoryCache;
    use crate::store::InMemoryJobStore;
    use pushline_core::{event_types, EventLog};

    fn ttls() -> CacheConfig {
        CacheConfig {
            url: String::new(),
            ttl_job: Duration::from_secs(600),
            ttl_job_list: Duration::from_secs(120),
            ttl_metrics: Duration::from_secs(60),
            ttl_aggregations: Duration::from_secs(300),
        }
    }

    fn service(
        store: Arc<InMemoryJobStore>,
        cache: Arc<InMemoryCache>,
    ) -> JobQueryService {
        JobQueryService::new(store, cache, ttls())
    }

    async fn seed(store: &InMemoryJobStore, n: usize, finish: impl Fn(usize, &mut Job)) -> Vec<Job> {
        let mut jobs = Vec::new();
        for i in 0..n {
            let mut job = Job::begin(
                Some(format!("msg-{i}")),
                Some(json!({"i": i})),
                Some("pubsub".into()),
                None,
            );
            let event = EventLog::new(
                event_types::MESSAGE_RECEIVED,
                Some(job.job_id),
                None,
                None,
                None,
            );
            finish(i, &mut job);
            store.create_job(&job, &event).await.unwrap();
            jobs.push(job);
        }
        jobs
    }

    #[tokio::test]
    async fn get_job_read_through_populates_cache_then_hits() {
        let store = Arc::new(InMemoryJobStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = service(store.clone(), cache.clone());

        let jobs = seed(&store, 1, |_, _| {}).await;
        let job_id = jobs[0].job_id;

        let first = service.get_job(job_id).await.unwrap().unwrap();
        let stats_after_first = cache.stats();
        assert_eq!(stats_after_first.hits, 0);
        assert_eq!(stats_after_first.misses, 1);

        let second = service.get_job(job_id).await.unwrap().unwrap();
        let stats_after_second = cache.stats();
        assert_eq!(stats_after_second.hits, 1);

        // Byte-identical regardless of hit/miss path.
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn get_job_absent_everywhere_is_none() {
        let store = Arc::new(InMemoryJobStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = service(store, cache);

        assert!(service.get_job(JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_jobs_pages_and_reports_total() {
        let store = Arc::new(InMemoryJobStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = service(store.clone(), cache);

        seed(&store, 25, |_, _| {}).await;

        let page2 = service.list_jobs(None, 2, 10).await.unwrap();
        assert_eq!(page2.jobs.len(), 10);
        assert_eq!(page2.total, 25);
        assert_eq!(page2.page, 2);

        let page3 = service.list_jobs(None, 3, 10).await.unwrap();
        assert_eq!(page3.jobs.len(), 5);
        assert_eq!(page3.total, 25);
    }

    #[tokio::test]
    async fn list_cache_is_not_invalidated_by_new_jobs() {
        let store = Arc::new(InMemoryJobStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = service(store.clone(), cache);

        seed(&store, 3, |_, _| {}).await;
        let first = service.list_jobs(None, 1, 10).await.unwrap();
        assert_eq!(first.total, 3);

        // A new job lands; the cached page stays stale until its TTL.
        seed(&store, 1, |_, _| {}).await;
        let second = service.list_jobs(None, 1, 10).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn statistics_success_rate_three_completed_one_failed() {
        let store = Arc::new(InMemoryJobStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = service(store.clone(), cache);

        seed(&store, 4, |i, job| {
            if i < 3 {
                job.complete(json!({})).unwrap();
            } else {
                job.fail("boom").unwrap();
            }
        })
        .await;

        let stats = service.job_statistics().await.unwrap();
        assert_eq!(stats.total_jobs, 4);
        assert_eq!(stats.success_rate, 75.0);
        assert_eq!(stats.total_retries, 1);
        assert!(stats.avg_duration_seconds.is_some());
    }

    #[tokio::test]
    async fn statistics_with_no_finished_jobs_has_zero_rate() {
        let store = Arc::new(InMemoryJobStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = service(store.clone(), cache);

        seed(&store, 2, |_, _| {}).await;

        let stats = service.job_statistics().await.unwrap();
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.avg_duration_seconds.is_none());
    }

    #[tokio::test]
    async fn job_events_come_back_oldest_first() {
        let store = Arc::new(InMemoryJobStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let service = service(store.clone(), cache);

        let jobs = seed(&store, 1, |_, _| {}).await;
        let job_id = jobs[0].job_id;
        let later = EventLog::new(event_types::JOB_COMPLETED, Some(job_id), None, None, None);
        store.update_job(&jobs[0], &later).await.unwrap();

        let events = service.job_events(job_id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "message.received");
        assert_eq!(events[1].event_type, "job.completed");
    }
}
