//! Redis-backed cache provider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, warn};

use super::{CacheProvider, CacheStats, HitMissCounters};

/// [`CacheProvider`] over a Redis connection manager (auto-reconnecting).
///
/// Every operation swallows backend errors: callers observe a miss or a no-op
/// and the error is logged, never propagated.
pub struct RedisCache {
    manager: ConnectionManager,
    counters: HitMissCounters,
    connected: AtomicBool,
}

impl RedisCache {
    /// Connect to Redis. Fails only at startup; once constructed, the
    /// manager reconnects in the background and operations degrade.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager,
            counters: HitMissCounters::default(),
            connected: AtomicBool::new(true),
        })
    }

    fn mark(&self, ok: bool) {
        self.connected.store(ok, Ordering::Relaxed);
    }
}

#[async_trait]
impl CacheProvider for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.manager.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(value)) => {
                self.mark(true);
                self.counters.record_hit();
                debug!(key, "cache hit");
                Some(value)
            }
            Ok(None) => {
                self.mark(true);
                self.counters.record_miss();
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                self.mark(false);
                self.counters.record_miss();
                warn!(key, error = %e, "cache get failed; treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let mut conn = self.manager.clone();
        let result: redis::RedisResult<()> = match ttl {
            Some(ttl) => conn.set_ex(key, value, ttl.as_secs().max(1)).await,
            None => conn.set(key, value).await,
        };
        match result {
            Ok(()) => {
                self.mark(true);
                debug!(key, ttl = ?ttl, "cache set");
            }
            Err(e) => {
                self.mark(false);
                warn!(key, error = %e, "cache set failed; skipping");
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let mut conn = self.manager.clone();
        match conn.del::<_, i64>(key).await {
            Ok(n) => {
                self.mark(true);
                n > 0
            }
            Err(e) => {
                self.mark(false);
                warn!(key, error = %e, "cache delete failed; skipping");
                false
            }
        }
    }

    async fn delete_matching(&self, pattern: &str) -> u64 {
        let mut conn = self.manager.clone();
        let keys: Vec<String> = match conn.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                self.mark(false);
                warn!(pattern, error = %e, "cache pattern scan failed; skipping");
                return 0;
            }
        };
        if keys.is_empty() {
            return 0;
        }
        match conn.del::<_, i64>(keys).await {
            Ok(n) => {
                self.mark(true);
                debug!(pattern, count = n, "cache invalidated");
                n.max(0) as u64
            }
            Err(e) => {
                self.mark(false);
                warn!(pattern, error = %e, "cache pattern delete failed; skipping");
                0
            }
        }
    }

    async fn ping(&self) -> bool {
        let mut conn = self.manager.clone();
        let ok = redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok();
        self.mark(ok);
        ok
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.connected.load(Ordering::Relaxed))
    }
}
