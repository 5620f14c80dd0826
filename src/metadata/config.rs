use serde::Deserialize;
use std::time::Duration;

use crate::metadata::types::{Quality, DEFAULT_PAGE_SIZE, DEFAULT_QUALITY};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub create_ttl_secs: u64,
    pub keep_alive_ttl_secs: u64,
    pub default_quality: Quality,
    pub default_page_size: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            create_ttl_secs: 24 * 60 * 60,           // 1 day
            keep_alive_ttl_secs: 90 * 24 * 60 * 60, // 90 days
            default_quality: DEFAULT_QUALITY,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl MetadataConfig {
    /// Lifetime of a record nobody has read yet.
    pub fn create_ttl(&self) -> Duration {
        Duration::from_secs(self.create_ttl_secs)
    }

    /// Lifetime granted on every successful read.
    pub fn keep_alive_ttl(&self) -> Duration {
        Duration::from_secs(self.keep_alive_ttl_secs)
    }
}
