//! HTTP client for the registry's agent and health APIs
//!
//! Every request is bounded by connect/read timeouts so a hung call can
//! never stall the heartbeat loop.

use std::time::Duration;

use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tracing::error;

use farol_api::RegistryConfig;

use crate::error::{Error, Result};

/// Configuration for the registry HTTP client
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Registry base URL (e.g. "http://127.0.0.1:8500")
    pub base_url: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8500".to_string(),
            connect_timeout_ms: 3000,
            read_timeout_ms: 5000,
        }
    }
}

impl HttpTransportConfig {
    /// Create a new config for a registry base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    /// Set timeouts
    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }
}

/// Thin typed wrapper around one `reqwest::Client` pointed at the
/// registry. Stateless between calls; safe to share across threads.
pub struct RegistryHttpClient {
    client: Client,
    config: HttpTransportConfig,
}

impl RegistryHttpClient {
    /// Create a new HTTP client
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client from resolved registry connection facts
    pub fn from_registry(registry: &RegistryConfig) -> Result<Self> {
        Self::new(HttpTransportConfig::new(&registry.base_url()))
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// PUT a JSON body, expecting a 2xx response
    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.build_url(path);
        let response = self.client.put(&url).json(body).send().await?;
        Self::expect_success(response).await
    }

    /// PUT without a body, expecting a 2xx response
    pub async fn put(&self, path: &str) -> Result<()> {
        let url = self.build_url(path);
        let response = self.client.put(&url).send().await?;
        Self::expect_success(response).await
    }

    /// PUT without a body, returning the raw status and body so the
    /// caller can distinguish expected non-2xx conditions
    pub async fn put_raw(&self, path: &str) -> Result<(u16, String)> {
        let url = self.build_url(path);
        let response = self.client.put(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    /// GET and parse a JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("request failed with status {}: {}", status, body);
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }

    async fn expect_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!("request failed with status {}: {}", status, body);
        Err(Error::Status {
            status: status.as_u16(),
            body,
        })
    }
}
