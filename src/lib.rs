// Core wallet and transaction types
pub mod core;

// Ledger history access
pub mod ledger;

// Scoring pipeline
pub mod scoring;

// Score persistence
pub mod database;

// Configuration
pub mod config;

// Re-export commonly used types for convenience
pub use crate::core::*;
pub use database::{MemoryScoreRepository, ScoreRepository, SqliteScoreRepository, StoredScore};
pub use ledger::{HistoryFetchError, LedgerHistoryClient, RetryingHistoryClient, ShyftHistoryClient};
pub use scoring::{CreditScoreService, ScoreReport, ScoringError};
