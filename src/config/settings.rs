//! Application configuration structures

use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::ledger::shyft_client::{ShyftClientConfig, SHYFT_API_BASE};
use crate::ledger::{RetryPolicy, DEFAULT_TX_NUM, MAX_TX_NUM};

pub const API_KEY_ENV: &str = "SHYFT_API_KEY";
pub const DATABASE_URL_ENV: &str = "SOFLEX_DATABASE_URL";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub ledger: Ledger,
    pub retry: RetryPolicy,
    pub storage: Storage,
    pub logging: Logging,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Ledger {
    pub base_url: String,
    pub network: String,
    /// Transactions sampled per score
    pub tx_num: u32,
    pub api_key: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            base_url: SHYFT_API_BASE.to_string(),
            network: "mainnet-beta".to_string(),
            tx_num: DEFAULT_TX_NUM,
            api_key: String::new(),
            request_timeout_secs: 15,
            connect_timeout_secs: 5,
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("base_url", &self.base_url)
            .field("network", &self.network)
            .field("tx_num", &self.tx_num)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Ledger {
    pub fn client_config(&self) -> ShyftClientConfig {
        ShyftClientConfig {
            base_url: self.base_url.clone(),
            network: self.network.clone(),
            api_key: self.api_key.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Storage {
    pub backend: StorageBackend,
    pub database_url: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_url: "sqlite:data/credit_scores.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    pub directory: String,
    pub file_prefix: String,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "soflex-credit.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path))?;
        Self::from_toml(&content).with_context(|| format!("failed to parse config file {}", path))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Environment overrides for secrets and deployment-specific values
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(DATABASE_URL_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, api_key: Option<String>, database_url: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.ledger.api_key = key;
        }
        if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
            self.storage.database_url = url;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ledger.api_key.trim().is_empty() {
            bail!("ledger API key is not set (set ledger.api_key or {})", API_KEY_ENV);
        }
        if self.ledger.tx_num == 0 || self.ledger.tx_num > MAX_TX_NUM {
            bail!("ledger.tx_num must be between 1 and {}, got {}", MAX_TX_NUM, self.ledger.tx_num);
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.database_url.trim().is_empty() {
            bail!("storage.database_url is empty");
        }
        Ok(())
    }
}
