// src/lib.rs
pub mod config;
pub mod ctl;
pub mod error;
pub mod keygen;
pub mod metadata;
pub mod metrics;
pub mod storage;

pub use config::AppConfig;
pub use error::{DecodeError, StorageError};
pub use keygen::IdGenerator;
pub use metadata::{FeedMetadata, LinkType, MetadataStore, Provider, Quality};
pub use storage::{KvBackend, MemoryBackend};
