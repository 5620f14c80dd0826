pub mod commands;
pub mod types;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::AppConfig;
use crate::storage::BackendKind;

use self::types::CtlError;

#[derive(Parser)]
#[command(author, version, about = "Inspect and administer the feed key store", long_about = None)]
pub struct PodsyncCtl {
    /// Config file (defaults to ./config.toml, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Override the configured Redis URL
    #[arg(long)]
    redis_url: Option<String>,

    /// Print Prometheus metrics after the command
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Redis,
    Memory,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Redis => BackendKind::Redis,
            BackendArg::Memory => BackendKind::Memory,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a feed configuration and print its key
    Save(commands::feed::SaveArgs),

    /// Print the feed configuration behind a key
    Load(commands::feed::LoadArgs),

    /// Issue a key without storing a record
    NextId,

    /// Reset the key counter (new keys may collide with live records)
    ResetCounter(commands::admin::ResetArgs),

    /// Measure round-trip latency to the store
    Ping,

    /// Print the counter value a key encodes (offline)
    Decode(commands::admin::DecodeArgs),
}

impl PodsyncCtl {
    pub fn app_config(&self) -> Result<AppConfig, CtlError> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(backend) = self.backend {
            config.backend.kind = backend.into();
        }
        if let Some(url) = &self.redis_url {
            config.backend.redis_url = url.clone();
        }
        Ok(config)
    }

    pub async fn run(self) -> Result<(), CtlError> {
        let config = self.app_config()?;

        match &self.command {
            Commands::Save(args) => commands::feed::save(&config, args).await?,
            Commands::Load(args) => commands::feed::load(&config, args).await?,
            Commands::NextId => commands::admin::next_id(&config).await?,
            Commands::ResetCounter(args) => commands::admin::reset_counter(&config, args).await?,
            Commands::Ping => commands::admin::ping(&config).await?,
            Commands::Decode(args) => commands::admin::decode(&config, args)?,
        }

        if self.metrics {
            print!("{}", crate::metrics::gather_text()?);
        }
        Ok(())
    }
}
