use clap::Args;

use crate::config::AppConfig;
use crate::ctl::types::CtlError;
use crate::metadata::{FeedMetadata, LinkType, MetadataStore, Provider, Quality};

#[derive(Args)]
pub struct SaveArgs {
    /// Source provider (YouTube, Vimeo)
    #[arg(short, long)]
    pub provider: Provider,

    /// Link kind (Channel, Playlist, User, Group, Video)
    #[arg(short = 't', long = "type")]
    pub link_type: LinkType,

    /// Upstream channel/playlist/user id
    #[arg(short, long)]
    pub id: String,

    /// Quality preference, defaults to the configured quality
    #[arg(short, long)]
    pub quality: Option<Quality>,

    /// Number of items in the generated feed, defaults to the configured page size
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl SaveArgs {
    pub fn to_metadata(&self, config: &AppConfig) -> FeedMetadata {
        FeedMetadata::new(self.provider, self.link_type, self.id.clone())
            .with_quality(self.quality.unwrap_or(config.metadata.default_quality))
            .with_page_size(self.page_size.unwrap_or(config.metadata.default_page_size))
    }
}

#[derive(Args)]
pub struct LoadArgs {
    /// Short key returned by `save`
    pub key: String,
}

pub async fn save(config: &AppConfig, args: &SaveArgs) -> Result<(), CtlError> {
    let store = MetadataStore::open(config).await?;
    let key = store.save(&args.to_metadata(config)).await?;
    println!("{}", key);
    Ok(())
}

pub async fn load(config: &AppConfig, args: &LoadArgs) -> Result<(), CtlError> {
    let store = MetadataStore::open(config).await?;
    let metadata = store.load(&args.key).await?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
