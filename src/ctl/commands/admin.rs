use clap::Args;

use crate::config::AppConfig;
use crate::ctl::types::CtlError;
use crate::keygen::{build_codec, decode_key};
use crate::metadata::MetadataStore;

#[derive(Args)]
pub struct ResetArgs {
    /// Confirm the reset; keys issued afterwards can collide with live records
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Short key to decode
    pub key: String,
}

pub async fn next_id(config: &AppConfig) -> Result<(), CtlError> {
    let store = MetadataStore::open(config).await?;
    println!("{}", store.keygen().next_id().await?);
    Ok(())
}

pub async fn reset_counter(config: &AppConfig, args: &ResetArgs) -> Result<(), CtlError> {
    if !args.yes {
        return Err(CtlError::InvalidArgument(
            "refusing to reset the key counter without --yes".to_string(),
        ));
    }

    let store = MetadataStore::open(config).await?;
    store.reset_counter().await?;
    println!("Counter {} reset", store.keygen().counter_key());
    Ok(())
}

pub async fn ping(config: &AppConfig) -> Result<(), CtlError> {
    let store = MetadataStore::open(config).await?;
    let rtt = store.ping().await?;
    println!("PONG in {:?}", rtt);
    Ok(())
}

pub fn decode(config: &AppConfig, args: &DecodeArgs) -> Result<(), CtlError> {
    let codec =
        build_codec(&config.keygen).map_err(|e| CtlError::InvalidArgument(e.to_string()))?;

    match decode_key(&codec, &args.key) {
        Some(counter) => {
            println!("{}", counter);
            Ok(())
        }
        None => Err(CtlError::InvalidArgument(format!(
            "{:?} was not issued with the configured salt",
            args.key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let config = AppConfig::default();
        let err = reset_counter(&config, &ResetArgs { yes: false })
            .await
            .unwrap_err();
        assert!(matches!(err, CtlError::InvalidArgument(_)));
    }

    #[test]
    fn test_decode_known_and_foreign_keys() {
        let config = AppConfig::default();
        let codec = build_codec(&config.keygen).unwrap();
        let key = codec.encode(&[7]);

        assert!(decode(&config, &DecodeArgs { key }).is_ok());
        assert!(decode(&config, &DecodeArgs { key: "!!!!".to_string() }).is_err());
    }
}
