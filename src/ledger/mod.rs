//! Ledger history access

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{Address, Transaction};

pub mod retry;
pub mod shyft_client;

pub use retry::{RetryPolicy, RetryingHistoryClient};
pub use shyft_client::{ShyftClientConfig, ShyftHistoryClient};

/// Default page size. Recent activity is sampled, not the full history.
pub const DEFAULT_TX_NUM: u32 = 2;
/// Largest page the history endpoint accepts
pub const MAX_TX_NUM: u32 = 100;

/// Errors from a single history request
#[derive(Error, Debug)]
pub enum HistoryFetchError {
    #[error("ledger client configuration error: {0}")]
    Config(String),

    #[error("invalid history request: {0}")]
    InvalidRequest(String),

    #[error("ledger transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("ledger request timed out after {0:?}")]
    Timeout(Duration),

    #[error("ledger API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("ledger API rejected the request: {message}")]
    Rejected { message: String },

    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

impl HistoryFetchError {
    /// Whether a wrapping layer may reasonably try the same request again
    pub fn is_retryable(&self) -> bool {
        match self {
            HistoryFetchError::Transport(err) => {
                err.is_timeout() || err.is_connect() || err.is_request()
            }
            HistoryFetchError::Timeout(_) => true,
            HistoryFetchError::Status { status, .. } => *status >= 500 || *status == 429,
            HistoryFetchError::Config(_)
            | HistoryFetchError::InvalidRequest(_)
            | HistoryFetchError::Rejected { .. }
            | HistoryFetchError::Malformed(_) => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, HistoryFetchError::Malformed(_))
    }
}

/// Source of recent transactions for a wallet.
///
/// Implementations issue a single request and return transactions in the
/// order supplied upstream.
#[async_trait]
pub trait LedgerHistoryClient: Send + Sync {
    async fn fetch_history(
        &self,
        address: &Address,
        limit: u32,
    ) -> Result<Vec<Transaction>, HistoryFetchError>;

    /// Stable name for logging
    fn name(&self) -> &str {
        "ledger"
    }
}

pub(crate) fn validate_limit(limit: u32) -> Result<(), HistoryFetchError> {
    if limit == 0 || limit > MAX_TX_NUM {
        return Err(HistoryFetchError::InvalidRequest(format!(
            "tx_num must be between 1 and {}, got {}",
            MAX_TX_NUM, limit
        )));
    }
    Ok(())
}
