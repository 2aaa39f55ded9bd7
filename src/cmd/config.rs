use anyhow::Result;
use async_trait::async_trait;
use clap::Args;

use super::{ConfigArgs, RunCommand};

/// Print the loaded configuration after defaults and validation
#[derive(Args)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for ShowConfigArgs {
    async fn run(&self) -> Result<()> {
        let cfg = self.config.load_config()?;
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        Ok(())
    }
}
