use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
pub struct KvEntry {
    pub value: Value,
    pub expires_at: Option<Instant>, // None = no expiry
}

impl KvEntry {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expiry) => now >= expiry,
            None => false,
        }
    }

    pub fn remaining_ttl(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expiry| expiry.saturating_duration_since(now))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub redis_url: String,
    pub num_shards: usize,
    pub sweep_interval_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            num_shards: 16, // power of 2 for fast modulo
            sweep_interval_ms: 1000,
        }
    }
}

impl BackendConfig {
    pub fn memory() -> Self {
        Self {
            kind: BackendKind::Memory,
            ..Self::default()
        }
    }
}
