//! Postgres-backed job store.
//!
//! Uses a bounded sqlx pool and explicit transactions so the job row and its
//! audit event always commit together. Rows are mapped by hand; the status
//! column is text and round-trips through `JobStatus`'s string form.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use pushline_core::{EventId, EventLog, Job, JobId, JobStatus};

use super::{JobAggregates, JobPage, JobStore, StoreError};
use crate::config::DatabaseConfig;

const JOB_COLUMNS: &str = "job_id, message_id, status, payload, result, error_message, \
     retry_count, max_retries, created_at, updated_at, started_at, completed_at, \
     source, correlation_id";

/// Postgres-backed implementation of [`JobStore`].
#[derive(Debug, Clone)]
pub struct PostgresJobStore {
    pool: Arc<PgPool>,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect with the bounded pool settings from config.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.pool_timeout)
            .max_lifetime(config.pool_recycle)
            .test_before_acquire(true)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the `jobs` and `event_logs` tables if they do not exist.
    /// Idempotent; safe to run on every startup.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id              BIGSERIAL PRIMARY KEY,
                job_id          UUID NOT NULL UNIQUE,
                message_id      TEXT,
                status          TEXT NOT NULL,
                payload         JSONB,
                result          JSONB,
                error_message   TEXT,
                retry_count     INTEGER NOT NULL DEFAULT 0,
                max_retries     INTEGER NOT NULL DEFAULT 3,
                created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
                started_at      TIMESTAMPTZ,
                completed_at    TIMESTAMPTZ,
                source          TEXT,
                correlation_id  TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs (status)",
            "CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs (created_at)",
            "CREATE INDEX IF NOT EXISTS idx_jobs_message_id ON jobs (message_id)",
            r#"
            CREATE TABLE IF NOT EXISTS event_logs (
                id              BIGSERIAL PRIMARY KEY,
                event_id        UUID NOT NULL UNIQUE,
                event_type      TEXT NOT NULL,
                job_id          UUID,
                data            JSONB,
                metadata        JSONB,
                "timestamp"     TIMESTAMPTZ NOT NULL DEFAULT now(),
                correlation_id  TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_event_logs_job_id ON event_logs (job_id)",
            "CREATE INDEX IF NOT EXISTS idx_event_logs_timestamp ON event_logs (\"timestamp\")",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&*self.pool).await?;
        }
        Ok(())
    }
}

fn job_from_row(row: &PgRow) -> Result<Job, StoreError> {
    let status_text: String = row.try_get("status")?;
    let status = JobStatus::from_str(&status_text)
        .map_err(|e| StoreError::Storage(format!("bad status column: {e}")))?;

    Ok(Job {
        job_id: JobId::from_uuid(row.try_get("job_id")?),
        message_id: row.try_get("message_id")?,
        status,
        payload: row.try_get("payload")?,
        result: row.try_get("result")?,
        error_message: row.try_get("error_message")?,
        retry_count: row.try_get("retry_count")?,
        max_retries: row.try_get("max_retries")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        source: row.try_get("source")?,
        correlation_id: row.try_get("correlation_id")?,
    })
}

fn event_from_row(row: &PgRow) -> Result<EventLog, StoreError> {
    Ok(EventLog {
        event_id: EventId::from_uuid(row.try_get("event_id")?),
        event_type: row.try_get("event_type")?,
        job_id: row
            .try_get::<Option<uuid::Uuid>, _>("job_id")?
            .map(JobId::from_uuid),
        data: row.try_get("data")?,
        metadata: row.try_get("metadata")?,
        timestamp: row.try_get("timestamp")?,
        correlation_id: row.try_get("correlation_id")?,
    })
}

async fn insert_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &EventLog,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO event_logs
            (event_id, event_type, job_id, data, metadata, "timestamp", correlation_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(event.event_id.as_uuid())
    .bind(&event.event_type)
    .bind(event.job_id.map(|id| *id.as_uuid()))
    .bind(&event.data)
    .bind(&event.metadata)
    .bind(event.timestamp)
    .bind(&event.correlation_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl JobStore for PostgresJobStore {
    #[instrument(skip(self, job, event), fields(job_id = %job.job_id), err)]
    async fn create_job(&self, job: &Job, event: &EventLog) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO jobs
                (job_id, message_id, status, payload, result, error_message,
                 retry_count, max_retries, created_at, updated_at, started_at,
                 completed_at, source, correlation_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(job.job_id.as_uuid())
        .bind(&job.message_id)
        .bind(job.status.as_str())
        .bind(&job.payload)
        .bind(&job.result)
        .bind(&job.error_message)
        .bind(job.retry_count)
        .bind(job.max_retries)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&job.source)
        .bind(&job.correlation_id)
        .execute(&mut *tx)
        .await?;

        insert_event(&mut tx, event).await?;
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, job, event), fields(job_id = %job.job_id, status = %job.status), err)]
    async fn update_job(&self, job: &Job, event: &EventLog) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let done = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2,
                result = $3,
                error_message = $4,
                retry_count = $5,
                updated_at = $6,
                completed_at = $7
            WHERE job_id = $1
            "#,
        )
        .bind(job.job_id.as_uuid())
        .bind(job.status.as_str())
        .bind(&job.result)
        .bind(&job.error_message)
        .bind(job.retry_count)
        .bind(job.updated_at)
        .bind(job.completed_at)
        .execute(&mut *tx)
        .await?;

        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(job.job_id));
        }

        insert_event(&mut tx, event).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = $1"))
            .bind(job_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn list_jobs(
        &self,
        status: Option<JobStatus>,
        page: u32,
        limit: u32,
    ) -> Result<JobPage, StoreError> {
        let status_text = status.map(|s| s.as_str());
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

        let total: i64 = sqlx::query(
            "SELECT COUNT(*) AS total FROM jobs WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status_text)
        .fetch_one(&*self.pool)
        .await?
        .try_get("total")?;

        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC, job_id DESC \
             OFFSET $2 LIMIT $3"
        ))
        .bind(status_text)
        .bind(offset)
        .bind(i64::from(limit))
        .fetch_all(&*self.pool)
        .await?;

        let jobs = rows
            .iter()
            .map(job_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JobPage { jobs, total })
    }

    async fn aggregates(&self) -> Result<JobAggregates, StoreError> {
        let total_jobs: i64 = sqlx::query("SELECT COUNT(*) AS total FROM jobs")
            .fetch_one(&*self.pool)
            .await?
            .try_get("total")?;

        let mut by_status = std::collections::BTreeMap::new();
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM jobs GROUP BY status")
            .fetch_all(&*self.pool)
            .await?;
        for row in rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            by_status.insert(status, count);
        }

        let avg_duration_seconds: Option<f64> = sqlx::query(
            r#"
            SELECT AVG(EXTRACT(EPOCH FROM (completed_at - started_at)))::DOUBLE PRECISION AS avg
            FROM jobs
            WHERE status = 'completed'
              AND completed_at IS NOT NULL
              AND started_at IS NOT NULL
            "#,
        )
        .fetch_one(&*self.pool)
        .await?
        .try_get("avg")?;

        let total_retries: i64 =
            sqlx::query("SELECT COALESCE(SUM(retry_count), 0)::BIGINT AS total FROM jobs")
                .fetch_one(&*self.pool)
                .await?
                .try_get("total")?;

        Ok(JobAggregates {
            total_jobs,
            by_status,
            avg_duration_seconds,
            total_retries,
        })
    }

    async fn events_for_job(&self, job_id: JobId) -> Result<Vec<EventLog>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, event_type, job_id, data, metadata, "timestamp", correlation_id
            FROM event_logs
            WHERE job_id = $1
            ORDER BY "timestamp" ASC
            "#,
        )
        .bind(job_id.as_uuid())
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(event_from_row).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&*self.pool).await?;
        Ok(())
    }
}
