use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::storage::error::BackendError;
use crate::storage::shard::Shard;
use crate::storage::ttl::{self, TtlManager};
use crate::storage::types::{BackendConfig, KvEntry, Value};
use crate::storage::KvBackend;

/// In-process backend with the same per-key atomicity as Redis: every
/// mutation runs under the owning shard's write lock.
#[derive(Debug)]
pub struct MemoryBackend {
    shards: Vec<Shard>,
    ttl_manager: TtlManager,
    sweeper: OnceLock<JoinHandle<()>>,
}

impl MemoryBackend {
    /// Builds the backend and, when called inside a tokio runtime, starts
    /// the expiry sweeper. Outside a runtime expiry is purely lazy.
    pub fn new(config: &BackendConfig) -> Arc<Self> {
        let shards = (0..config.num_shards.max(1)).map(|_| Shard::new()).collect();

        let engine = Arc::new(Self {
            shards,
            ttl_manager: TtlManager::new(),
            sweeper: OnceLock::new(),
        });

        if tokio::runtime::Handle::try_current().is_ok() && config.sweep_interval_ms > 0 {
            let handle = ttl::start_background_task(
                Arc::downgrade(&engine),
                Duration::from_millis(config.sweep_interval_ms),
            );
            let _ = engine.sweeper.set(handle);
        }

        engine
    }

    fn get_shard(&self, key: &str) -> &Shard {
        let hash = fxhash::hash32(key.as_bytes());
        &self.shards[(hash as usize) % self.shards.len()]
    }

    pub fn increment(&self, key: &str, delta: i64) -> Result<i64, BackendError> {
        let now = Instant::now();
        self.get_shard(key).update(key, now, |slot| match slot {
            None => {
                *slot = Some(KvEntry::new(Value::Str(delta.to_string())));
                Ok(delta)
            }
            Some(entry) => match &mut entry.value {
                Value::Str(raw) => {
                    let current: i64 = raw
                        .parse()
                        .map_err(|_| BackendError::NotAnInteger(key.to_string()))?;
                    let next = current
                        .checked_add(delta)
                        .ok_or_else(|| BackendError::Overflow(key.to_string()))?;
                    *raw = next.to_string();
                    Ok(next)
                }
                Value::Hash(_) => Err(BackendError::WrongType(key.to_string())),
            },
        })
    }

    pub fn set_fields(&self, key: &str, fields: &[(&str, String)]) -> Result<(), BackendError> {
        let now = Instant::now();
        self.get_shard(key).update(key, now, |slot| {
            let entry = slot.get_or_insert_with(|| KvEntry::new(Value::Hash(HashMap::new())));
            match &mut entry.value {
                Value::Hash(map) => {
                    for (field, value) in fields {
                        map.insert((*field).to_string(), value.clone());
                    }
                    Ok(())
                }
                Value::Str(_) => Err(BackendError::WrongType(key.to_string())),
            }
        })
    }

    pub fn get_fields(&self, key: &str) -> Result<HashMap<String, String>, BackendError> {
        match self.get_shard(key).get(key, Instant::now()) {
            None => Ok(HashMap::new()),
            Some(KvEntry {
                value: Value::Hash(map),
                ..
            }) => Ok(map),
            Some(_) => Err(BackendError::WrongType(key.to_string())),
        }
    }

    pub fn set_expiry(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let deadline = now + ttl;
        let applied = self.get_shard(key).update(key, now, |slot| match slot {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                true
            }
            None => false,
        });

        if applied {
            self.ttl_manager.add(key.to_string(), deadline);
        }
        applied
    }

    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.get_shard(key)
            .get(key, now)
            .and_then(|entry| entry.remaining_ttl(now))
    }

    pub fn remove(&self, key: &str) -> bool {
        self.ttl_manager.cancel(key);
        self.get_shard(key).del(key, Instant::now()).is_some()
    }

    /// Removes every key whose deadline has passed. Returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        self.ttl_manager
            .pop_due(now)
            .into_iter()
            .filter(|key| self.get_shard(key).purge_if_expired(key, now))
            .count()
    }

    /// Number of stored keys, including expired ones not yet reaped.
    pub fn key_count(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }
}

impl Drop for MemoryBackend {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get() {
            handle.abort();
        }
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn incr(&self, key: &str, delta: i64) -> Result<i64, BackendError> {
        self.increment(key, delta)
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<(), BackendError> {
        self.set_fields(key, fields)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, BackendError> {
        self.get_fields(key)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, BackendError> {
        Ok(self.set_expiry(key, ttl))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, BackendError> {
        Ok(self.remaining_ttl(key))
    }

    async fn del(&self, key: &str) -> Result<bool, BackendError> {
        Ok(self.remove(key))
    }

    // No round trip in process.
    async fn ping(&self) -> Result<Duration, BackendError> {
        Ok(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BackendConfig {
        BackendConfig {
            num_shards: 4,
            sweep_interval_ms: 100,
            ..BackendConfig::memory()
        }
    }

    #[tokio::test]
    async fn test_incr_starts_from_zero() {
        let engine = MemoryBackend::new(&test_config());

        assert_eq!(engine.incr("counter", 1).await.unwrap(), 1);
        assert_eq!(engine.incr("counter", 1).await.unwrap(), 2);
        assert_eq!(engine.incr("counter", 5).await.unwrap(), 7);

        assert!(engine.del("counter").await.unwrap());
        assert_eq!(engine.incr("counter", 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_wrong_type_is_rejected() {
        let engine = MemoryBackend::new(&test_config());

        engine
            .hset_multiple("record", &[("id", "abc".to_string())])
            .await
            .unwrap();
        engine.incr("counter", 1).await.unwrap();

        assert!(matches!(
            engine.incr("record", 1).await.unwrap_err(),
            BackendError::WrongType(_)
        ));
        assert!(matches!(
            engine.hgetall("counter").await.unwrap_err(),
            BackendError::WrongType(_)
        ));
    }

    #[tokio::test]
    async fn test_hash_fields_merge() {
        let engine = MemoryBackend::new(&test_config());

        engine
            .hset_multiple("record", &[("a", "1".to_string()), ("b", "2".to_string())])
            .await
            .unwrap();
        engine
            .hset_multiple("record", &[("b", "3".to_string())])
            .await
            .unwrap();

        let fields = engine.hgetall("record").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["a"], "1");
        assert_eq!(fields["b"], "3");

        assert!(engine.hgetall("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let engine = MemoryBackend::new(&test_config());
        assert!(!engine.expire("missing", Duration::from_secs(10)).await.unwrap());
        assert_eq!(engine.ttl("missing").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_ttl_expiry() {
        let engine = MemoryBackend::new(&test_config());

        engine
            .hset_multiple("temp", &[("id", "expiring".to_string())])
            .await
            .unwrap();
        assert!(engine.expire("temp", Duration::from_secs(1)).await.unwrap());
        assert!(!engine.hgetall("temp").await.unwrap().is_empty());

        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(engine.hgetall("temp").await.unwrap().is_empty());
        assert_eq!(engine.ttl("temp").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_extends_deadline() {
        let engine = MemoryBackend::new(&test_config());

        engine
            .hset_multiple("temp", &[("id", "kept".to_string())])
            .await
            .unwrap();
        engine.expire("temp", Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        engine.expire("temp", Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(engine.sweep_expired(), 0);
        assert!(!engine.hgetall("temp").await.unwrap().is_empty());

        let remaining = engine.ttl("temp").await.unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(50));
        assert!(remaining > Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_expire_queues_one_event() {
        let engine = MemoryBackend::new(&test_config());

        engine
            .hset_multiple("hot", &[("id", "popular".to_string())])
            .await
            .unwrap();
        for _ in 0..10_000 {
            engine.expire("hot", Duration::from_secs(90 * 24 * 60 * 60)).await.unwrap();
        }

        assert_eq!(engine.key_count(), 1);
        assert_eq!(engine.ttl_manager.pending(), 1);
    }

    #[tokio::test]
    async fn test_ping_is_immediate() {
        let engine = MemoryBackend::new(&test_config());
        assert_eq!(engine.ping().await.unwrap(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reaps_expired_keys() {
        let engine = MemoryBackend::new(&test_config());

        for i in 0..10 {
            let key = format!("key_{}", i);
            engine
                .hset_multiple(&key, &[("id", i.to_string())])
                .await
                .unwrap();
            engine.expire(&key, Duration::from_secs(1)).await.unwrap();
        }
        engine
            .hset_multiple("durable", &[("id", "stays".to_string())])
            .await
            .unwrap();
        assert_eq!(engine.key_count(), 11);

        tokio::time::advance(Duration::from_secs(2)).await;
        // Let the sweeper observe the new clock.
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(engine.key_count(), 1);
    }

    #[tokio::test]
    async fn test_storage_sharding() {
        let engine = MemoryBackend::new(&test_config());

        for i in 0..100 {
            let key = format!("key_{}", i);
            engine
                .hset_multiple(&key, &[("value", format!("value_{}", i))])
                .await
                .unwrap();
        }

        for i in 0..100 {
            let key = format!("key_{}", i);
            let fields = engine.hgetall(&key).await.unwrap();
            assert_eq!(fields["value"], format!("value_{}", i));
        }
        assert_eq!(engine.key_count(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_incr_is_atomic() {
        let engine = MemoryBackend::new(&test_config());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..100 {
                    seen.push(engine.incr("counter", 1).await.unwrap());
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 800);
        assert_eq!(all.last(), Some(&800));
    }
}
