use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use clap::Args;
use console::style;

use crate::client::factory::ClientFactory;
use crate::live::Watcher;
use crate::logs;
use crate::types::event::EventKind;

use super::{ConfigArgs, RunCommand};

/// Stream change notifications from the server and print one line per
/// event
#[derive(Args)]
pub struct WatchArgs {
    /// Only show events for these resources, overrides the config file.
    #[arg(short, long)]
    pub resource: Vec<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for WatchArgs {
    async fn run(&self) -> Result<()> {
        let cfg = self.config.load_config()?;
        logs::init(&cfg.log_level)?;

        let factory = ClientFactory::new(&cfg);
        let client = factory.build_client().await?;

        let mut watch_cfg = cfg.watch.clone();
        if !self.resource.is_empty() {
            watch_cfg.resources = self.resource.clone();
        }

        let watcher = Watcher::new(client, &watch_cfg);
        let (handle, mut events) = watcher.subscribe();

        while let Some(event) = events.recv().await {
            let kind = match event.kind {
                EventKind::Created => style(event.kind).green(),
                EventKind::Updated => style(event.kind).yellow(),
                EventKind::Deleted => style(event.kind).red(),
            };
            let time = match Local.timestamp_opt(event.timestamp as i64, 0).single() {
                Some(time) => time.format("%H:%M:%S").to_string(),
                None => String::from("--:--:--"),
            };
            println!("{time} {kind} {}/{}", event.resource, event.id);
        }

        handle.await?;
        Ok(())
    }
}
