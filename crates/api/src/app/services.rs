//! Service wiring: explicitly constructed handles, injected via Extension.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use pushline_infra::{
    AppConfig, CacheConfig, CacheProvider, EchoProcessor, InMemoryCache, InMemoryJobStore,
    JobLifecycle, JobQueryService, JobStore, NoopCache, PayloadProcessor, PostgresJobStore,
    RedisCache,
};

/// Everything a request handler needs, built once at startup.
pub struct AppServices {
    pub lifecycle: JobLifecycle,
    pub queries: JobQueryService,
    pub store: Arc<dyn JobStore>,
    pub cache: Arc<dyn CacheProvider>,
    pub processor: Arc<dyn PayloadProcessor>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn JobStore>,
        cache: Arc<dyn CacheProvider>,
        processor: Arc<dyn PayloadProcessor>,
        source: &str,
        max_retries: i32,
        cache_config: CacheConfig,
    ) -> Self {
        let lifecycle = JobLifecycle::new(
            store.clone(),
            cache.clone(),
            source,
            max_retries,
            cache_config.ttl_job,
        );
        let queries = JobQueryService::new(store.clone(), cache.clone(), cache_config);
        Self {
            lifecycle,
            queries,
            store,
            cache,
            processor,
        }
    }

    /// Postgres + Redis wiring for production.
    ///
    /// The store is required: startup fails without it. The cache is
    /// best-effort by contract, so a Redis connection failure degrades to the
    /// no-op provider instead of aborting.
    pub async fn persistent(config: &AppConfig) -> anyhow::Result<Self> {
        let store = PostgresJobStore::connect(&config.database).await?;
        store.init_schema().await?;

        let cache: Arc<dyn CacheProvider> = match RedisCache::connect(&config.cache.url).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                warn!(error = %e, "redis unavailable; running with a no-op cache");
                Arc::new(NoopCache::new())
            }
        };

        Ok(Self::new(
            Arc::new(store),
            cache,
            Arc::new(EchoProcessor),
            &config.source,
            config.max_retries,
            config.cache.clone(),
        ))
    }

    /// In-memory wiring for tests and local development.
    pub fn in_memory() -> Self {
        let cache_config = CacheConfig {
            url: String::new(),
            ttl_job: Duration::from_secs(600),
            ttl_job_list: Duration::from_secs(120),
            ttl_metrics: Duration::from_secs(60),
            ttl_aggregations: Duration::from_secs(300),
        };
        Self::new(
            Arc::new(InMemoryJobStore::new()),
            Arc::new(InMemoryCache::new()),
            Arc::new(EchoProcessor),
            "pubsub",
            3,
            cache_config,
        )
    }

    /// In-memory wiring with a custom processor (failure paths in tests).
    pub fn in_memory_with_processor(processor: Arc<dyn PayloadProcessor>) -> Self {
        let mut services = Self::in_memory();
        services.processor = processor;
        services
    }
}
