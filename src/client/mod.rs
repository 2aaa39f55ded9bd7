pub mod factory;

use std::time::Duration;
use std::{fs, io};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::info;
use reqwest::{Certificate, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::gateway::DecisionService;
use crate::types::check::{CheckRequest, CheckResponse};
use crate::types::event::{EventQuery, LiveEvent};
use crate::types::healthz::{HealthzResponse, STATUS_SERVING};

const MIME_JSON: &str = "application/json";

/// HTTP client for the external decision service.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    client: reqwest::Client,
    token: Option<String>,
    instance: Option<String>,
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Network error: {0}")]
    Network(#[from] anyhow::Error),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Server error: code {code}, {message}")]
    Server { code: u16, message: String },

    #[error("Check health error: {0}")]
    Health(String),

    #[error("Server returned invalid json: {0:?}")]
    InvalidJson(String),
}

impl Client {
    pub async fn connect(url: &str, cert_path: &str, timeout: Duration) -> Result<Self> {
        let url = url.trim_end_matches('/');
        let parsed = match Url::parse(url) {
            Ok(url) => url,
            Err(_) => bail!("invalid server url '{url}'"),
        };
        match parsed.scheme() {
            "http" | "https" => {}
            _ => bail!(
                "invalid url scheme, expect 'http' or 'https', not '{}'",
                parsed.scheme()
            ),
        }

        if parsed.path() != "/" {
            bail!(
                "invalid server url, path should be '/', not '{}'",
                parsed.path()
            );
        }

        let builder = reqwest::Client::builder().timeout(timeout);
        let client = if cert_path.is_empty() || parsed.scheme() == "http" {
            builder.build().context("build server client")?
        } else {
            match fs::read(cert_path) {
                Ok(data) => {
                    let cert = Certificate::from_pem(&data).context("load cert file")?;
                    builder
                        .add_root_certificate(cert)
                        // reqwest does not always honor a self-signed root
                        // added this way, see
                        //   <https://github.com/seanmonstar/reqwest/issues/1554>
                        .danger_accept_invalid_certs(true)
                        .build()
                        .context("build server client")?
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    builder.build().context("build server client")?
                }
                Err(err) => return Err(err).context("read cert file"),
            }
        };

        let client = Client {
            url: url.to_string(),
            client,
            token: None,
            instance: None,
        };
        client.check_health().await?;

        Ok(client)
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Hosted playground deployments route policy lookups by instance id,
    /// carried as a request header.
    pub fn set_instance(&mut self, instance: String) {
        self.instance = Some(instance);
    }

    pub async fn healthz(&self) -> Result<HealthzResponse, RequestError> {
        self.do_request_json::<(), _>(Method::GET, "healthz", None)
            .await
    }

    async fn check_health(&self) -> Result<(), RequestError> {
        let resp = self.healthz().await?;
        if resp.status != STATUS_SERVING {
            return Err(RequestError::Health(format!(
                "decision service is not serving, status is '{}'",
                resp.status
            )));
        }

        let version = resp.version.unwrap_or(String::from("unknown"));
        info!(
            "Connected to decision service '{}', version '{version}'",
            self.url
        );

        Ok(())
    }

    pub async fn read_events(&self, query: &EventQuery) -> Result<Vec<LiveEvent>, RequestError> {
        self.do_request_json(Method::GET, "api/events", Some(query))
            .await
    }

    async fn do_request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, RequestError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.url, path);
        let mut req = self
            .client
            .request(method, &url)
            .header("Accept", MIME_JSON);

        if let Some(body) = body {
            let json = serde_json::to_string(body).unwrap();
            req = req.header("Content-Type", MIME_JSON).body(json);
        }
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(instance) = &self.instance {
            req = req.header("X-Playground-Instance", instance.clone());
        }

        let req = match req.build() {
            Ok(req) => req,
            Err(e) => return Err(RequestError::Client(format!("build request failed: {e:#}"))),
        };

        let resp = match self.client.execute(req).await {
            Ok(resp) => resp,
            Err(e) => return Err(RequestError::Network(e.into())),
        };

        let code = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => return Err(RequestError::Network(e.into())),
        };

        if !code.is_success() {
            return Err(RequestError::Server {
                code: code.as_u16(),
                message: text.trim().to_string(),
            });
        }

        match serde_json::from_str(&text) {
            Ok(data) => Ok(data),
            Err(_) => Err(RequestError::InvalidJson(text)),
        }
    }
}

#[async_trait]
impl DecisionService for Client {
    async fn check(&self, req: &CheckRequest) -> Result<CheckResponse, RequestError> {
        self.do_request_json(Method::POST, "api/check", Some(req))
            .await
    }
}
