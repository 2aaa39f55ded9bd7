use anyhow::Result;

use crate::config::Config;

use super::Client;

pub struct ClientFactory {
    server: String,
    cert_path: String,
    token: String,
    instance: String,
    timeout: std::time::Duration,
}

impl ClientFactory {
    pub fn new(cfg: &Config) -> Self {
        Self {
            server: cfg.server.clone(),
            cert_path: cfg.cert_path.clone(),
            token: cfg.token.clone(),
            instance: cfg.instance.clone(),
            timeout: cfg.timeout(),
        }
    }

    pub async fn build_client(&self) -> Result<Client> {
        let mut client = Client::connect(&self.server, &self.cert_path, self.timeout).await?;

        if !self.token.is_empty() {
            client.set_token(self.token.clone());
        }
        if !self.instance.is_empty() {
            client.set_instance(self.instance.clone());
        }

        Ok(client)
    }
}
