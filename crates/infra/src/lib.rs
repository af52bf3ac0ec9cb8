//! Infrastructure for the push-notification job worker: durable store,
//! best-effort cache, the lifecycle engine, and the query service.

pub mod cache;
pub mod config;
pub mod lifecycle;
pub mod processor;
pub mod query;
pub mod store;

pub use cache::{CacheKey, CacheProvider, CacheStats, InMemoryCache, NoopCache, RedisCache};
pub use config::{AppConfig, CacheConfig, DatabaseConfig};
pub use lifecycle::{JobLifecycle, LifecycleError};
pub use processor::{EchoProcessor, FailingProcessor, PayloadProcessor, ProcessingError};
pub use query::{JobListPage, JobQueryService, JobStatistics, QueryError};
pub use store::{InMemoryJobStore, JobAggregates, JobPage, JobStore, PostgresJobStore, StoreError};
