use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use podsync_storage::config::AppConfig;
use podsync_storage::storage::{BackendConfig, KvBackend, MemoryBackend};
use podsync_storage::{FeedMetadata, LinkType, MetadataStore, Provider, Quality, StorageError};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn memory_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.backend = BackendConfig {
        num_shards: 4,
        sweep_interval_ms: 100,
        ..BackendConfig::memory()
    };
    config
}

#[tokio::test]
async fn test_full_system_integration() {
    let store = MetadataStore::open(&memory_config()).await.unwrap();

    let metadata = FeedMetadata::new(Provider::YouTube, LinkType::Channel, "UCabc123")
        .with_quality(Quality::VideoHigh)
        .with_page_size(50);

    let key = store.save(&metadata).await.unwrap();
    assert!(key.len() >= 4);
    assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));

    let loaded = store.load(&key).await.unwrap();
    assert_eq!(loaded, metadata);

    let ttl = store.backend().ttl(&key).await.unwrap().unwrap();
    assert!(ttl >= 89 * DAY);

    assert!(matches!(
        store.load("nonexistent-key").await.unwrap_err(),
        StorageError::NotFound(_)
    ));
    assert!(matches!(
        store.load("").await.unwrap_err(),
        StorageError::Validation(_)
    ));
}

#[tokio::test]
async fn test_keys_unique_until_reset() {
    let store = MetadataStore::open(&memory_config()).await.unwrap();
    let metadata = FeedMetadata::new(Provider::Vimeo, LinkType::Channel, "staffpicks");

    let mut keys = Vec::new();
    for _ in 0..200 {
        keys.push(store.save(&metadata).await.unwrap());
    }
    let unique: HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());

    store.reset_counter().await.unwrap();
    assert_eq!(store.keygen().next_id().await.unwrap(), keys[0]);
}

#[tokio::test(start_paused = true)]
async fn test_unclaimed_record_expires_after_a_day() {
    let backend = MemoryBackend::new(&memory_config().backend);
    let store = MetadataStore::new(
        backend.clone(),
        podsync_storage::IdGenerator::new(backend.clone(), &memory_config().keygen).unwrap(),
        memory_config().metadata,
    );

    let metadata = FeedMetadata::new(Provider::YouTube, LinkType::Playlist, "PLxyz");
    let unclaimed = store.save(&metadata).await.unwrap();
    let claimed = store.save(&metadata).await.unwrap();

    tokio::time::advance(DAY / 2).await;
    store.load(&claimed).await.unwrap();

    tokio::time::advance(DAY).await;

    assert!(matches!(
        store.load(&unclaimed).await.unwrap_err(),
        StorageError::NotFound(_)
    ));
    assert_eq!(store.load(&claimed).await.unwrap(), metadata);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_get_distinct_keys() {
    let store = MetadataStore::open(&memory_config()).await.unwrap();

    let mut handles = Vec::new();
    for worker in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut saved = Vec::new();
            for i in 0..25 {
                let metadata =
                    FeedMetadata::new(Provider::YouTube, LinkType::User, format!("user-{}-{}", worker, i));
                let key = store.save(&metadata).await.unwrap();
                saved.push((key, metadata));
            }
            saved
        }));
    }

    let mut keys = HashSet::new();
    for handle in handles {
        for (key, metadata) in handle.await.unwrap() {
            assert_eq!(store.load(&key).await.unwrap(), metadata);
            assert!(keys.insert(key));
        }
    }
    assert_eq!(keys.len(), 200);
}

#[tokio::test]
async fn test_legacy_records_coexist_with_new_ones() {
    let backend = MemoryBackend::new(&memory_config().backend);
    let config = memory_config();
    let store = MetadataStore::new(
        backend.clone(),
        podsync_storage::IdGenerator::new(backend.clone(), &config.keygen).unwrap(),
        config.metadata,
    );

    let backend: Arc<dyn KvBackend> = backend;
    backend
        .hset_multiple(
            "old1",
            &[
                ("provider", "YouTube".to_string()),
                ("type", "Channel".to_string()),
                ("id", "UColder".to_string()),
            ],
        )
        .await
        .unwrap();

    let fresh = FeedMetadata::new(Provider::YouTube, LinkType::Channel, "UCnewer")
        .with_quality(Quality::AudioLow)
        .with_page_size(10);
    let key = store.save(&fresh).await.unwrap();

    let legacy = store.load("old1").await.unwrap();
    assert_eq!(legacy.quality, Quality::VideoHigh);
    assert_eq!(legacy.page_size, 50);
    assert_eq!(store.load(&key).await.unwrap(), fresh);
}

/// Needs a running Redis: `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`
#[cfg(feature = "redis-backend")]
#[tokio::test]
#[ignore]
async fn test_redis_round_trip() {
    let mut config = AppConfig::default();
    config.backend.redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    config.keygen.counter_key = "keygen:integration-test".to_string();

    let store = MetadataStore::open(&config).await.unwrap();
    store.ping().await.unwrap();
    store.reset_counter().await.unwrap();

    let metadata = FeedMetadata::new(Provider::YouTube, LinkType::Channel, "UCabc123");
    let key = store.save(&metadata).await.unwrap();
    assert_eq!(key, store.keygen().codec().encode(&[1]));

    let ttl = store.backend().ttl(&key).await.unwrap().unwrap();
    assert!(ttl <= DAY);

    assert_eq!(store.load(&key).await.unwrap(), metadata);
    let ttl = store.backend().ttl(&key).await.unwrap().unwrap();
    assert!(ttl >= 89 * DAY);

    store.backend().del(&key).await.unwrap();
    store.reset_counter().await.unwrap();
}
