use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::keygen::config::KeygenConfig;
use crate::metadata::config::MetadataConfig;
use crate::storage::types::BackendConfig;

const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub keygen: KeygenConfig,
    pub metadata: MetadataConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Reads `path`, or `config.toml` in the working directory, falling back
    /// to the built-in defaults when neither exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_str = match path {
            Some(path) => std::fs::read_to_string(path)?,
            None => std::fs::read_to_string("config.toml")
                .unwrap_or_else(|_| DEFAULT_CONFIG.to_string()),
        };
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keygen.counter_key.trim().is_empty() {
            return Err(ConfigError::Invalid("keygen.counter_key is empty".to_string()));
        }
        if self.metadata.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "metadata.default_page_size must be positive".to_string(),
            ));
        }
        if self.metadata.create_ttl_secs == 0 || self.metadata.keep_alive_ttl_secs == 0 {
            return Err(ConfigError::Invalid("metadata TTLs must be positive".to_string()));
        }
        Ok(())
    }
}
