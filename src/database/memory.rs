//! In-process score store backed by a concurrent map

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use super::{RepositoryError, ScoreRepository, StoredScore};
use crate::core::{Address, CreditScore};

#[derive(Debug, Default)]
pub struct MemoryScoreRepository {
    scores: DashMap<String, StoredScore>,
}

impl MemoryScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[async_trait]
impl ScoreRepository for MemoryScoreRepository {
    async fn upsert_score(&self, address: &Address, score: CreditScore) -> Result<(), RepositoryError> {
        let stored = StoredScore {
            wallet_address: address.to_string(),
            on_chain_credit_score: score.value(),
            updated_at: Utc::now(),
        };
        self.scores.insert(address.to_string(), stored);
        debug!(address = %address, score = score.value(), "credit score stored in memory");
        Ok(())
    }

    async fn get_score(&self, address: &Address) -> Result<Option<StoredScore>, RepositoryError> {
        Ok(self.scores.get(address.as_str()).map(|entry| entry.value().clone()))
    }
}
