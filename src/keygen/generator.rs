use std::sync::Arc;

use harsh::{BuildError, Harsh};
use tracing::{debug, info};

use crate::error::{DecodeError, StorageError};
use crate::keygen::config::KeygenConfig;
use crate::metrics;
use crate::storage::KvBackend;

/// Hashids codec for the configured salt and minimum length.
pub fn build_codec(config: &KeygenConfig) -> Result<Harsh, BuildError> {
    Harsh::builder()
        .salt(config.salt.as_str())
        .length(config.min_length)
        .build()
}

/// The counter value `key` encodes, if it encodes exactly one.
pub fn decode_key(codec: &Harsh, key: &str) -> Option<u64> {
    match codec.decode(key).ok()?.as_slice() {
        [counter] => Some(*counter),
        _ => None,
    }
}

/// Issues short keys by incrementing one counter in the backing store and
/// encoding the new value.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    backend: Arc<dyn KvBackend>,
    codec: Arc<Harsh>,
    counter_key: String,
}

impl IdGenerator {
    pub fn new(backend: Arc<dyn KvBackend>, config: &KeygenConfig) -> Result<Self, BuildError> {
        let codec = build_codec(config)?;
        Ok(Self {
            backend,
            codec: Arc::new(codec),
            counter_key: config.counter_key.clone(),
        })
    }

    pub fn codec(&self) -> &Harsh {
        &self.codec
    }

    pub fn counter_key(&self) -> &str {
        &self.counter_key
    }

    pub async fn next_id(&self) -> Result<String, StorageError> {
        let value = self.backend.incr(&self.counter_key, 1).await?;
        let counter = u64::try_from(value).map_err(|_| DecodeError::CounterOutOfRange(value))?;

        let key = self.codec.encode(&[counter]);
        metrics::KEYS_ISSUED.inc();
        debug!(counter, key = %key, "Issued key");

        Ok(key)
    }

    /// Deletes the counter so the next key is the very first one again.
    ///
    /// Keys issued after a reset can collide with records that are still
    /// alive; only use this on an empty or disposable store.
    pub async fn reset_counter(&self) -> Result<(), StorageError> {
        self.backend.del(&self.counter_key).await?;
        info!(counter_key = %self.counter_key, "Key counter reset");
        Ok(())
    }

    /// The counter value a key was issued for, if it is one of ours.
    pub fn decode(&self, key: &str) -> Option<u64> {
        decode_key(&self.codec, key)
    }
}
