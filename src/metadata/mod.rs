pub mod config;
pub mod store;
pub mod types;

pub use config::MetadataConfig;
pub use store::MetadataStore;
pub use types::{FeedMetadata, LinkType, Provider, Quality, Symbolic};
