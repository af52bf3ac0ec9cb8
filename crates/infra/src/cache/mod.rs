//! Best-effort cache layer.
//!
//! The cache is never authoritative: every operation degrades to a miss or a
//! no-op when the backend is unavailable, and logs instead of raising. A
//! cache outage must never block a write to the durable store.

mod memory;
mod redis;

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use memory::{InMemoryCache, NoopCache};
pub use redis::RedisCache;

/// Hit/miss counters and connection health.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub connected: bool,
    pub hits: u64,
    pub misses: u64,
    /// Percentage; misses are floored at 1 so the ratio is always defined.
    pub hit_rate: f64,
}

/// Capability interface over the key-value cache.
///
/// All values are canonical JSON text so reads deserialize to the same shape
/// regardless of producer. Implementations must not raise on backend
/// unavailability.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Look up a key. Absent and "backend down" are both `None`.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value, optionally with a TTL. Best-effort.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>);

    /// Evict one key. Returns whether a key was removed.
    async fn delete(&self, key: &str) -> bool;

    /// Evict every key matching a glob pattern (e.g. `job:list:*`).
    /// Returns the number of keys removed.
    async fn delete_matching(&self, pattern: &str) -> u64;

    /// Connectivity probe.
    async fn ping(&self) -> bool;

    fn stats(&self) -> CacheStats;
}

/// Read a JSON value through any provider.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheProvider, key: &str) -> Option<T> {
    let raw = cache.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "cache entry failed to deserialize; treating as miss");
            None
        }
    }
}

/// Write a JSON value through any provider. Best-effort.
pub async fn set_json<T: Serialize>(
    cache: &dyn CacheProvider,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) {
    match serde_json::to_string(value) {
        Ok(raw) => cache.set(key, &raw, ttl).await,
        Err(e) => tracing::warn!(key, error = %e, "cache value failed to serialize; skipping set"),
    }
}

/// Builders for the stable cache key formats shared across the system.
pub struct CacheKey;

impl CacheKey {
    pub const JOB: &'static str = "job";
    pub const JOB_LIST: &'static str = "job:list";
    pub const METRICS: &'static str = "metrics";
    pub const AGGREGATION: &'static str = "agg";

    /// `job:{job_id}`
    pub fn job(job_id: impl Display) -> String {
        format!("{}:{}", Self::JOB, job_id)
    }

    /// `job:list[:status:{status}]:page:{n}:limit:{m}`
    pub fn job_list(status: Option<&str>, page: u32, limit: u32) -> String {
        match status {
            Some(status) => format!(
                "{}:status:{}:page:{}:limit:{}",
                Self::JOB_LIST,
                status,
                page,
                limit
            ),
            None => format!("{}:page:{}:limit:{}", Self::JOB_LIST, page, limit),
        }
    }

    /// `metrics:{metric_name}:{window}`
    pub fn metrics(metric_name: &str, window: &str) -> String {
        format!("{}:{}:{}", Self::METRICS, metric_name, window)
    }

    /// `agg:{agg_type}:{period}`
    pub fn aggregation(agg_type: &str, period: &str) -> String {
        format!("{}:{}:{}", Self::AGGREGATION, agg_type, period)
    }
}

/// Shared hit/miss bookkeeping for provider implementations.
#[derive(Debug, Default)]
pub(crate) struct HitMissCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitMissCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, connected: bool) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = hits as f64 / (hits + misses.max(1)) as f64 * 100.0;
        CacheStats {
            connected,
            hits,
            misses,
            hit_rate,
        }
    }
}
