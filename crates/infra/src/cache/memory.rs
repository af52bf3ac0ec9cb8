//! In-memory and no-op cache providers for tests and degraded mode.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{CacheProvider, CacheStats, HitMissCounters};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// TTL-honoring in-process cache. The test/dev stand-in for Redis.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    counters: HitMissCounters,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Glob match supporting a single trailing `*` (the only form the system
/// uses: prefix patterns like `job:list:*`).
fn matches_pattern(key: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                self.counters.record_hit();
                Some(value)
            }
            Some(_) => {
                entries.remove(key);
                self.counters.record_miss();
                None
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    async fn delete(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    async fn delete_matching(&self, pattern: &str) -> u64 {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !matches_pattern(key, pattern));
        (before - entries.len()) as u64
    }

    async fn ping(&self) -> bool {
        true
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(true)
    }
}

/// Always-miss provider: models an unreachable cache backend.
///
/// Used to verify that cache unavailability degrades silently and never
/// blocks the durable write path.
#[derive(Debug, Default)]
pub struct NoopCache {
    counters: HitMissCounters,
}

impl NoopCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheProvider for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        self.counters.record_miss();
        None
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) {}

    async fn delete(&self, _key: &str) -> bool {
        false
    }

    async fn delete_matching(&self, _pattern: &str) -> u64 {
        0
    }

    async fn ping(&self) -> bool {
        false
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let cache = InMemoryCache::new();
        cache.set("job:1", "{\"a\":1}", None).await;
        assert_eq!(cache.get("job:1").await.as_deref(), Some("{\"a\":1}"));
        assert!(cache.delete("job:1").await);
        assert_eq!(cache.get("job:1").await, None);
        assert!(!cache.delete("job:1").await);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryCache::new();
        cache
            .set("agg:job_stats:all", "{}", Some(Duration::from_millis(20)))
            .await;
        assert!(cache.get("agg:job_stats:all").await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("agg:job_stats:all").await, None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn delete_matching_removes_prefix_only() {
        let cache = InMemoryCache::new();
        cache.set("job:list:page:1:limit:10", "{}", None).await;
        cache.set("job:list:page:2:limit:10", "{}", None).await;
        cache.set("job:abc", "{}", None).await;

        let removed = cache.delete_matching("job:list:*").await;
        assert_eq!(removed, 2);
        assert!(cache.get("job:abc").await.is_some());
    }

    #[tokio::test]
    async fn hit_and_miss_counters_feed_stats() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", None).await;
        cache.get("k").await;
        cache.get("absent").await;

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!(stats.connected);
    }

    #[tokio::test]
    async fn noop_cache_never_stores() {
        let cache = NoopCache::new();
        cache.set("k", "v", None).await;
        assert_eq!(cache.get("k").await, None);
        assert!(!cache.ping().await);
        assert!(!cache.stats().connected);
    }
}
