//! Credit score orchestration: fetch, aggregate, score, persist

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::aggregator::{count, percentages};
use super::formula::compute_score;
use crate::core::{Address, AddressError, ClassifiedCount, CreditScore, ScoreInputs};
use crate::database::{RepositoryError, ScoreRepository};
use crate::ledger::{HistoryFetchError, LedgerHistoryClient, DEFAULT_TX_NUM};

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("transaction history unavailable: {0}")]
    HistoryUnavailable(#[source] HistoryFetchError),

    #[error("transaction history malformed: {0}")]
    MalformedHistory(String),

    #[error("failed to persist credit score: {0}")]
    PersistFailed(#[source] RepositoryError),
}

impl ScoringError {
    /// True only for transient history failures worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ScoringError::HistoryUnavailable(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<HistoryFetchError> for ScoringError {
    fn from(err: HistoryFetchError) -> Self {
        match err {
            HistoryFetchError::Malformed(reason) => ScoringError::MalformedHistory(reason),
            other => ScoringError::HistoryUnavailable(other),
        }
    }
}

/// Result of a successful scoring run.
///
/// `persist_failure` is set when the score was computed but could not be
/// stored; the score itself is still valid.
#[derive(Debug, Serialize)]
pub struct ScoreReport {
    pub address: Address,
    pub score: CreditScore,
    pub counts: ClassifiedCount,
    pub inputs: ScoreInputs,
    #[serde(
        rename = "persist_error",
        serialize_with = "serialize_persist_failure",
        skip_serializing_if = "Option::is_none"
    )]
    pub persist_failure: Option<ScoringError>,
}

fn serialize_persist_failure<S>(failure: &Option<ScoringError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&failure.as_ref().map(|e| e.to_string()).unwrap_or_default())
}

impl ScoreReport {
    pub fn persisted(&self) -> bool {
        self.persist_failure.is_none()
    }
}

pub struct CreditScoreService {
    ledger: Arc<dyn LedgerHistoryClient>,
    repository: Arc<dyn ScoreRepository>,
    tx_num: u32,
}

impl CreditScoreService {
    pub fn new(ledger: Arc<dyn LedgerHistoryClient>, repository: Arc<dyn ScoreRepository>) -> Self {
        Self {
            ledger,
            repository,
            tx_num: DEFAULT_TX_NUM,
        }
    }

    /// Overrides the history page size
    pub fn with_tx_num(mut self, tx_num: u32) -> Self {
        self.tx_num = tx_num;
        self
    }

    pub fn tx_num(&self) -> u32 {
        self.tx_num
    }

    /// Scores a wallet and stores the result.
    ///
    /// History failures abort before the repository is touched. A failed
    /// write is reported on the returned report instead of failing the call.
    #[instrument(skip(self), fields(ledger = self.ledger.name()))]
    pub async fn score_address(&self, address: &str) -> Result<ScoreReport, ScoringError> {
        let address = Address::new(address)?;

        let transactions = self
            .ledger
            .fetch_history(&address, self.tx_num)
            .await
            .map_err(|e| {
                warn!(address = %address, error = %e, "transaction history fetch failed");
                ScoringError::from(e)
            })?;

        let counts = count(&address, &transactions);
        let inputs = percentages(counts);
        let score = compute_score(&inputs);
        debug!(
            address = %address,
            sent = counts.sent,
            received = counts.received,
            undefined = inputs.is_undefined(),
            "transaction history aggregated"
        );

        let persist_failure = match self.repository.upsert_score(&address, score).await {
            Ok(()) => None,
            Err(e) => {
                warn!(address = %address, error = %e, "⚠️ credit score computed but not persisted");
                Some(ScoringError::PersistFailed(e))
            }
        };

        info!(address = %address, score = score.value(), "📊 credit score computed");

        Ok(ScoreReport {
            address,
            score,
            counts,
            inputs,
            persist_failure,
        })
    }
}
