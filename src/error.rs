use thiserror::Error;

use crate::storage::error::BackendError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Transport error: {0}")]
    Transport(#[from] BackendError),

    #[error("Invalid key generator settings: {0}")]
    Settings(#[from] harsh::BuildError),
}

/// A stored value that does not map back onto the record model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unknown {kind} value {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Record is missing field {0:?}")]
    MissingField(&'static str),

    #[error("Invalid page size {0:?}")]
    InvalidPageSize(String),

    #[error("Counter value {0} cannot be encoded")]
    CounterOutOfRange(i64),
}
