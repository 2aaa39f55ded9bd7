use std::fs;
use std::io;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::principal::Principal;

mod defaults;

const DEFAULT_PATH: &str = "~/.config/cangate.toml";

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base url of the decision service, e.g. "https://pdp.example.com".
    #[serde(default = "defaults::empty_string")]
    pub server: String,

    /// Optional PEM root certificate for a self-hosted service.
    #[serde(default = "defaults::empty_string")]
    pub cert_path: String,

    /// Optional static bearer token sent with every request.
    #[serde(default = "defaults::empty_string")]
    pub token: String,

    /// Optional hosted playground instance id.
    #[serde(default = "defaults::empty_string")]
    pub instance: String,

    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "defaults::log_level")]
    pub log_level: String,

    #[serde(default)]
    pub principal: PrincipalConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

/// Default identity for checks; command line flags override these.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrincipalConfig {
    #[serde(default = "defaults::empty_string")]
    pub id: String,

    #[serde(default = "defaults::empty_vec")]
    pub roles: Vec<String>,

    #[serde(default)]
    pub attr: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "defaults::watch_interval")]
    pub interval_ms: u32,

    /// Only forward events for these resources; empty means all.
    #[serde(default = "defaults::empty_vec")]
    pub resources: Vec<String>,
}

impl Config {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut cfg = Self::_load(path)?;
        cfg.validate().context("validate config")?;
        Ok(cfg)
    }

    fn _load(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_string(),
            None => shellexpand::tilde(DEFAULT_PATH).to_string(),
        };

        match fs::read(&path) {
            Ok(data) => {
                let toml_str = String::from_utf8(data)
                    .with_context(|| format!("decode config file '{path}' into utf-8"))?;

                let cfg: Config = toml::from_str(&toml_str)
                    .with_context(|| format!("parse config file '{path}' toml"))?;

                Ok(cfg)
            }

            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),

            Err(err) => Err(err).with_context(|| format!("read config file '{path}'")),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.principal.id.clone(),
            roles: self.principal.roles.clone(),
            attr: self.principal.attr.clone(),
        }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn default() -> Self {
        Self {
            server: defaults::empty_string(),
            cert_path: defaults::empty_string(),
            token: defaults::empty_string(),
            instance: defaults::empty_string(),
            timeout_secs: defaults::timeout_secs(),
            log_level: defaults::log_level(),
            principal: PrincipalConfig::default(),
            watch: WatchConfig::default(),
        }
    }

    fn validate(&mut self) -> Result<()> {
        if self.server.is_empty() {
            bail!("config server cannot be empty");
        }

        self.cert_path = shellexpand::tilde(&self.cert_path).to_string();

        if self.timeout_secs < 1 || self.timeout_secs > 300 {
            bail!(
                "config timeout_secs should be in range [1,300], found {}",
                self.timeout_secs
            );
        }

        if self.watch.interval_ms < 100 || self.watch.interval_ms > 60000 {
            bail!(
                "config watch interval_ms should be in range [100,60000], found {}",
                self.watch.interval_ms
            );
        }

        Ok(())
    }
}

impl Default for PrincipalConfig {
    fn default() -> Self {
        Self {
            id: defaults::empty_string(),
            roles: defaults::empty_vec(),
            attr: Map::new(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: defaults::watch_interval(),
            resources: defaults::empty_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let toml_str = r#"
server = "https://pdp.example.com"
token = "secret"

[principal]
id = "demoUser"
roles = ["admin"]

[watch]
interval_ms = 500
resources = ["posts"]
"#;
        let mut cfg: Config = toml::from_str(toml_str).unwrap();
        cfg.validate().unwrap();

        assert_eq!(cfg.server, "https://pdp.example.com");
        assert_eq!(cfg.token, "secret");
        assert_eq!(cfg.timeout_secs, defaults::timeout_secs());
        assert_eq!(cfg.principal.id, "demoUser");
        assert_eq!(cfg.principal.roles, vec!["admin".to_string()]);
        assert_eq!(cfg.watch.interval_ms, 500);
    }

    #[test]
    fn test_validate() {
        let mut cfg = Config::default();
        assert!(cfg.validate().is_err(), "empty server should be rejected");

        cfg.server = "https://pdp.example.com".to_string();
        cfg.watch.interval_ms = 10;
        assert!(
            cfg.validate().is_err(),
            "out of range interval should be rejected"
        );

        cfg.watch.interval_ms = 1000;
        cfg.validate().unwrap();
    }
}
