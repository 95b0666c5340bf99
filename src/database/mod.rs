//! Credit score persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Address, CreditScore};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryScoreRepository;
pub use sqlite::SqliteScoreRepository;

/// Score persistence errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database connection failed: {0}")]
    ConnectionError(String),

    #[error("Query execution failed: {0}")]
    QueryError(String),

    #[error("SQLite error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

/// Last persisted score for a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScore {
    pub wallet_address: String,
    pub on_chain_credit_score: f64,
    pub updated_at: DateTime<Utc>,
}

/// Upsert-by-address score storage.
///
/// Writes overwrite the previous value for the address; no history is kept.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    async fn upsert_score(&self, address: &Address, score: CreditScore) -> Result<(), RepositoryError>;

    async fn get_score(&self, address: &Address) -> Result<Option<StoredScore>, RepositoryError>;
}
