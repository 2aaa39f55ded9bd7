use anyhow::Result;
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;

mod check;
mod config;
mod watch;

#[derive(Parser)]
#[command(author, version, about)]
pub struct App {
    #[command(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Check(check::CheckArgs),
    Config(config::ShowConfigArgs),
    Watch(watch::WatchArgs),
}

#[async_trait]
pub trait RunCommand {
    async fn run(&self) -> Result<()>;
}

/// Shared flags for locating the config file.
#[derive(Args)]
pub struct ConfigArgs {
    /// Path to the config file, defaults to ~/.config/cangate.toml.
    #[arg(long)]
    pub config: Option<String>,
}

impl ConfigArgs {
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config.as_deref())
    }
}

impl App {
    pub async fn run(&self) -> Result<()> {
        match &self.commands {
            Commands::Check(args) => args.run().await,
            Commands::Config(args) => args.run().await,
            Commands::Watch(args) => args.run().await,
        }
    }
}
