use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Args;
use console::style;
use serde_json::{Map, Value};

use crate::client::factory::ClientFactory;
use crate::config::Config;
use crate::gateway::AccessGateway;
use crate::logs;
use crate::types::principal::Principal;

use super::{ConfigArgs, RunCommand};

/// Ask the decision service whether a principal may perform an action on
/// a resource, and print the verdict
#[derive(Args)]
pub struct CheckArgs {
    /// Resource kind, e.g. "posts".
    pub resource: String,

    /// Action to check, e.g. "edit" or "delete".
    pub action: String,

    /// Identifier of the record acted on; omit for create and list checks.
    #[arg(short, long)]
    pub id: Option<String>,

    /// Record attributes, repeated key=value pairs.
    #[arg(short, long)]
    pub attr: Vec<String>,

    /// Principal id, overrides the config file.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Principal roles, overrides the config file.
    #[arg(short, long)]
    pub role: Vec<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for CheckArgs {
    async fn run(&self) -> Result<()> {
        let cfg = self.config.load_config()?;
        logs::init(&cfg.log_level)?;

        let principal = self.build_principal(&cfg)?;
        let record = self.build_record()?;

        let factory = ClientFactory::new(&cfg);
        let client = factory.build_client().await?;
        let gateway = AccessGateway::new(client);

        let allow = gateway
            .can_perform(&principal, &self.resource, &self.action, record.as_ref())
            .await?;

        let verdict = if allow {
            style("ALLOW").green().bold()
        } else {
            style("DENY").red().bold()
        };
        let target = match self.id {
            Some(ref id) => format!("{}/{id}", self.resource),
            None => self.resource.clone(),
        };
        println!("{} {} {target}: {verdict}", principal.id, self.action);

        Ok(())
    }
}

impl CheckArgs {
    fn build_principal(&self, cfg: &Config) -> Result<Principal> {
        let mut principal = cfg.principal();
        if let Some(ref user) = self.user {
            principal.id = user.clone();
        }
        if !self.role.is_empty() {
            principal.roles = self.role.clone();
        }

        if principal.id.is_empty() {
            bail!("principal id is empty, set --user or principal.id in config");
        }

        Ok(principal)
    }

    fn build_record(&self) -> Result<Option<Map<String, Value>>> {
        if self.id.is_none() && self.attr.is_empty() {
            return Ok(None);
        }

        let mut record = Map::new();
        if let Some(ref id) = self.id {
            record.insert(String::from("id"), Value::String(id.clone()));
        }
        for pair in self.attr.iter() {
            let Some((key, value)) = pair.split_once('=') else {
                bail!("invalid attr '{pair}', expect key=value");
            };
            record.insert(key.to_string(), Value::String(value.to_string()));
        }

        Ok(Some(record))
    }
}
