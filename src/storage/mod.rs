pub mod engine;
pub mod error;
#[cfg(feature = "redis-backend")]
pub mod redis;
pub mod shard;
pub mod ttl;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use engine::MemoryBackend;
pub use error::BackendError;
#[cfg(feature = "redis-backend")]
pub use self::redis::RedisBackend;
pub use types::{BackendConfig, BackendKind};

/// The store primitives the key generator and metadata store are built on.
/// Each call maps onto one atomic command of the backing store.
#[async_trait]
pub trait KvBackend: Send + Sync + std::fmt::Debug {
    /// Atomically adds `delta` to the integer at `key` (absent counts as 0)
    /// and returns the new value.
    async fn incr(&self, key: &str, delta: i64) -> Result<i64, BackendError>;

    /// Sets all `fields` on the hash at `key` in one step.
    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<(), BackendError>;

    /// All fields of the hash at `key`; empty when the key does not exist.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, BackendError>;

    /// Sets the time-to-live of `key`. Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, BackendError>;

    /// Remaining time-to-live, `None` if the key is missing or has no expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, BackendError>;

    async fn del(&self, key: &str) -> Result<bool, BackendError>;

    async fn ping(&self) -> Result<Duration, BackendError>;
}

pub async fn open_backend(config: &BackendConfig) -> Result<Arc<dyn KvBackend>, BackendError> {
    match config.kind {
        BackendKind::Memory => {
            tracing::info!(shards = config.num_shards, "Opened in-memory backend");
            Ok(MemoryBackend::new(config))
        }
        #[cfg(feature = "redis-backend")]
        BackendKind::Redis => {
            let backend = RedisBackend::connect(&config.redis_url).await?;
            tracing::info!(url = %config.redis_url, "Connected to Redis");
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "redis-backend"))]
        BackendKind::Redis => Err(BackendError::Unavailable(
            "built without the redis-backend feature".to_string(),
        )),
    }
}
