use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::AppConfig;
use crate::error::{DecodeError, StorageError};
use crate::keygen::IdGenerator;
use crate::metadata::config::MetadataConfig;
use crate::metadata::types::{FeedMetadata, LinkType, Provider, Quality, Symbolic};
use crate::metrics;
use crate::storage::KvBackend;

// Field names are shared with records written by earlier deployments.
const PROVIDER_FIELD: &str = "provider";
const TYPE_FIELD: &str = "type";
const ID_FIELD: &str = "id";
const QUALITY_FIELD: &str = "quality";
const PAGE_SIZE_FIELD: &str = "pageSize";

// Records written before quality and pageSize existed hold exactly these
// three fields. Anything larger is read as a current record.
const LEGACY_FIELD_COUNT: usize = 3;

/// Persists feed configurations under short keys.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    backend: Arc<dyn KvBackend>,
    keygen: IdGenerator,
    config: MetadataConfig,
}

impl MetadataStore {
    pub fn new(backend: Arc<dyn KvBackend>, keygen: IdGenerator, config: MetadataConfig) -> Self {
        Self {
            backend,
            keygen,
            config,
        }
    }

    pub async fn open(config: &AppConfig) -> Result<Self, StorageError> {
        let backend = crate::storage::open_backend(&config.backend).await?;
        let keygen = IdGenerator::new(backend.clone(), &config.keygen)?;
        Ok(Self::new(backend, keygen, config.metadata.clone()))
    }

    pub fn keygen(&self) -> &IdGenerator {
        &self.keygen
    }

    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// Stores `metadata` under a freshly issued key and returns the key.
    /// The record lives for the creation TTL unless someone loads it.
    pub async fn save(&self, metadata: &FeedMetadata) -> Result<String, StorageError> {
        let result = self.save_record(metadata).await;
        metrics::record_op("save", &result);
        result
    }

    async fn save_record(&self, metadata: &FeedMetadata) -> Result<String, StorageError> {
        if metadata.id.trim().is_empty() {
            return Err(StorageError::Validation("Feed id can't be empty".to_string()));
        }
        if metadata.page_size == 0 {
            return Err(StorageError::Validation(
                "Page size must be positive".to_string(),
            ));
        }

        let key = self.keygen.next_id().await?;

        self.backend.hset_multiple(&key, &encode_record(metadata)).await?;
        self.backend.expire(&key, self.config.create_ttl()).await?;

        debug!(key = %key, provider = %metadata.provider, link_type = %metadata.link_type, "Saved feed metadata");
        Ok(key)
    }

    /// Reads the record under `key` and extends its lifetime to the keep-alive TTL.
    pub async fn load(&self, key: &str) -> Result<FeedMetadata, StorageError> {
        let result = self.load_record(key).await;
        metrics::record_op("load", &result);
        result
    }

    async fn load_record(&self, key: &str) -> Result<FeedMetadata, StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::Validation("Feed key can't be empty".to_string()));
        }

        let fields = self.backend.hgetall(key).await?;
        if fields.is_empty() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        // Refresh before decoding: a record that is asked for stays alive even if it is corrupt.
        self.backend.expire(key, self.config.keep_alive_ttl()).await?;

        if fields.len() <= LEGACY_FIELD_COUNT {
            metrics::LEGACY_RECORDS.inc();
            debug!(key = %key, "Legacy record, filling quality and page size defaults");
        }

        let metadata = decode_record(&fields, &self.config)?;
        debug!(key = %key, "Loaded feed metadata");
        Ok(metadata)
    }

    /// See [`IdGenerator::reset_counter`]: new keys may collide with live records.
    pub async fn reset_counter(&self) -> Result<(), StorageError> {
        let result = self.keygen.reset_counter().await;
        metrics::record_op("reset_counter", &result);
        result
    }

    pub async fn ping(&self) -> Result<Duration, StorageError> {
        let result = self.backend.ping().await.map_err(StorageError::from);
        metrics::record_op("ping", &result);
        result
    }
}

fn encode_record(metadata: &FeedMetadata) -> [(&'static str, String); 5] {
    [
        (PROVIDER_FIELD, metadata.provider.to_string()),
        (TYPE_FIELD, metadata.link_type.to_string()),
        (ID_FIELD, metadata.id.clone()),
        (QUALITY_FIELD, metadata.quality.to_string()),
        (PAGE_SIZE_FIELD, metadata.page_size.to_string()),
    ]
}

fn decode_record(
    fields: &HashMap<String, String>,
    config: &MetadataConfig,
) -> Result<FeedMetadata, DecodeError> {
    let id = required(fields, ID_FIELD)?.to_string();
    let link_type = LinkType::from_symbol(required(fields, TYPE_FIELD)?)?;
    let provider = Provider::from_symbol(required(fields, PROVIDER_FIELD)?)?;

    let (quality, page_size) = if fields.len() > LEGACY_FIELD_COUNT {
        (
            Quality::from_symbol(required(fields, QUALITY_FIELD)?)?,
            parse_page_size(required(fields, PAGE_SIZE_FIELD)?)?,
        )
    } else {
        (config.default_quality, config.default_page_size)
    };

    Ok(FeedMetadata {
        provider,
        link_type,
        id,
        quality,
        page_size,
    })
}

fn required<'a>(fields: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str, DecodeError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or(DecodeError::MissingField(name))
}

fn parse_page_size(raw: &str) -> Result<u32, DecodeError> {
    match raw.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(DecodeError::InvalidPageSize(raw.to_string())),
    }
}
