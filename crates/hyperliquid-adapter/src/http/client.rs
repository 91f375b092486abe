/*
[INPUT]:  HTTP configuration (base URL, timeouts)
[OUTPUT]: Configured reqwest client for the info and exchange endpoints
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::errors::{HyperliquidError, Result};

const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";
const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";
const MAINNET_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";
const TESTNET_WS_URL: &str = "wss://api.hyperliquid-testnet.xyz/ws";

/// Target network, carrying its API and WS endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseUrl {
    #[default]
    Mainnet,
    Testnet,
}

impl BaseUrl {
    pub fn api_url(&self) -> &'static str {
        match self {
            BaseUrl::Mainnet => MAINNET_API_URL,
            BaseUrl::Testnet => TESTNET_API_URL,
        }
    }

    pub fn ws_url(&self) -> &'static str {
        match self {
            BaseUrl::Mainnet => MAINNET_WS_URL,
            BaseUrl::Testnet => TESTNET_WS_URL,
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, BaseUrl::Mainnet)
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Thin JSON-POST client shared by the info and exchange surfaces
#[derive(Debug, Clone)]
pub struct HttpClient {
    http_client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(base_url: BaseUrl) -> Result<Self> {
        Self::with_config(base_url, ClientConfig::default())
    }

    pub fn with_config(base_url: BaseUrl, config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url: Url::parse(base_url.api_url())?,
            timeout: config.timeout,
        })
    }

    /// Override the base URL, for tests against a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)?;
        Ok(self)
    }

    /// POST a JSON body and decode the JSON response. Deadline overruns are
    /// reported as a timeout, distinct from venue errors.
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path)?;
        debug!(%url, "POST");
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let response = response.error_for_status().map_err(HyperliquidError::Http)?;
        let parsed = response.json::<T>().await.map_err(|e| self.classify(e))?;
        Ok(parsed)
    }

    fn classify(&self, err: reqwest::Error) -> HyperliquidError {
        if err.is_timeout() {
            HyperliquidError::Timeout {
                duration_secs: self.timeout.as_secs(),
            }
        } else {
            HyperliquidError::Http(err)
        }
    }
}
