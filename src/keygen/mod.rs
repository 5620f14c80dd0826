pub mod config;
pub mod generator;

pub use config::KeygenConfig;
pub use generator::{build_codec, decode_key, IdGenerator};
