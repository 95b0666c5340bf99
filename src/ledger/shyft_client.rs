//! Shyft transaction history API client
//!
//! Issues one `GET /sol/v1/transaction/history` per call, authenticated with
//! the `x-api-key` header. No caching and no retries happen here.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{validate_limit, HistoryFetchError, LedgerHistoryClient};
use crate::core::{Address, Transaction};

pub const SHYFT_API_BASE: &str = "https://api.shyft.to";
const HISTORY_PATH: &str = "sol/v1/transaction/history";
const API_KEY_HEADER: &str = "x-api-key";
/// Longest error body kept in `HistoryFetchError::Status`
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct ShyftClientConfig {
    pub base_url: String,
    /// Cluster name, e.g. "mainnet-beta" or "devnet"
    pub network: String,
    pub api_key: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl fmt::Debug for ShyftClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShyftClientConfig")
            .field("base_url", &self.base_url)
            .field("network", &self.network)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ShyftClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: SHYFT_API_BASE.to_string(),
            network: "mainnet-beta".to_string(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Response envelope: `{ success, message, result: [...] }`
#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

pub struct ShyftHistoryClient {
    client: Client,
    endpoint: Url,
    network: String,
    api_key: String,
    request_timeout: Duration,
}

impl ShyftHistoryClient {
    pub fn new(config: ShyftClientConfig) -> Result<Self, HistoryFetchError> {
        if config.api_key.trim().is_empty() {
            return Err(HistoryFetchError::Config("ledger API key is empty".to_string()));
        }
        if config.network.trim().is_empty() {
            return Err(HistoryFetchError::Config("ledger network is empty".to_string()));
        }

        let endpoint = format!("{}/{}", config.base_url.trim_end_matches('/'), HISTORY_PATH);
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            HistoryFetchError::Config(format!("invalid ledger base URL {}: {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| HistoryFetchError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            network: config.network,
            api_key: config.api_key,
            request_timeout: config.request_timeout,
        })
    }

    fn history_url(&self, address: &Address, limit: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("network", &self.network)
            .append_pair("tx_num", &limit.to_string())
            .append_pair("account", address.as_str())
            .append_pair("enable_raw", "true");
        url
    }

    fn map_send_error(&self, err: reqwest::Error) -> HistoryFetchError {
        if err.is_timeout() {
            HistoryFetchError::Timeout(self.request_timeout)
        } else {
            HistoryFetchError::Transport(err)
        }
    }
}

/// Decodes a history response body into transactions
pub fn parse_history(body: &str) -> Result<Vec<Transaction>, HistoryFetchError> {
    let envelope: HistoryEnvelope = serde_json::from_str(body)
        .map_err(|e| HistoryFetchError::Malformed(format!("invalid JSON envelope: {}", e)))?;

    if envelope.success == Some(false) {
        return Err(HistoryFetchError::Rejected {
            message: envelope.message.unwrap_or_else(|| "no message".to_string()),
        });
    }

    let result = envelope
        .result
        .ok_or_else(|| HistoryFetchError::Malformed("missing `result` field".to_string()))?;

    serde_json::from_value(result)
        .map_err(|e| HistoryFetchError::Malformed(format!("unexpected transaction shape: {}", e)))
}

#[async_trait]
impl LedgerHistoryClient for ShyftHistoryClient {
    #[instrument(skip(self, address), fields(address = %address))]
    async fn fetch_history(
        &self,
        address: &Address,
        limit: u32,
    ) -> Result<Vec<Transaction>, HistoryFetchError> {
        validate_limit(limit)?;

        let url = self.history_url(address, limit);
        debug!(network = %self.network, tx_num = limit, "requesting transaction history");

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "ledger history request failed");
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(HistoryFetchError::Status { status: status.as_u16(), body });
        }

        let transactions = parse_history(&body)?;
        debug!(count = transactions.len(), "transaction history received");
        Ok(transactions)
    }

    fn name(&self) -> &str {
        "shyft"
    }
}
