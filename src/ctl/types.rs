use thiserror::Error;

#[derive(Error, Debug)]
pub enum CtlError {
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
