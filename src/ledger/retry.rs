//! Bounded timeout and retry wrapper around any [`LedgerHistoryClient`]

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::{HistoryFetchError, LedgerHistoryClient};
use crate::core::{Address, Transaction};

/// Retry policy for transient failures only (timeouts, connect errors, 5xx, 429)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Per-attempt deadline
    pub attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 2_000,
            attempt_timeout_ms: 20_000,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff capped at `max_delay_ms`. `attempt` is 1-based.
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let exp = attempt.saturating_sub(1);
        let mult = 1u64.checked_shl(exp).unwrap_or(u64::MAX);
        self.base_delay_ms.saturating_mul(mult).min(self.max_delay_ms)
    }
}

pub struct RetryingHistoryClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: LedgerHistoryClient> RetryingHistoryClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn attempt(
        &self,
        address: &Address,
        limit: u32,
    ) -> Result<Vec<Transaction>, HistoryFetchError> {
        let deadline = Duration::from_millis(self.policy.attempt_timeout_ms);
        match timeout(deadline, self.inner.fetch_history(address, limit)).await {
            Ok(result) => result,
            Err(_) => Err(HistoryFetchError::Timeout(deadline)),
        }
    }
}

#[async_trait]
impl<C: LedgerHistoryClient> LedgerHistoryClient for RetryingHistoryClient<C> {
    async fn fetch_history(
        &self,
        address: &Address,
        limit: u32,
    ) -> Result<Vec<Transaction>, HistoryFetchError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(address, limit).await {
                Ok(transactions) => {
                    if attempt > 1 {
                        debug!(client = self.inner.name(), attempt, "history fetch recovered");
                    }
                    return Ok(transactions);
                }
                Err(err) if err.is_retryable() && attempt < attempts => {
                    let delay_ms = self.policy.backoff_delay_ms(attempt);
                    warn!(
                        client = self.inner.name(),
                        attempt,
                        attempts,
                        delay_ms,
                        error = %err,
                        "transient ledger failure; retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails with the given status for the first `failures` calls
    struct FlakyClient {
        calls: Arc<AtomicU32>,
        failures: u32,
        status: u16,
    }

    #[async_trait]
    impl LedgerHistoryClient for FlakyClient {
        async fn fetch_history(
            &self,
            _address: &Address,
            _limit: u32,
        ) -> Result<Vec<Transaction>, HistoryFetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(HistoryFetchError::Status { status: self.status, body: String::new() });
            }
            Ok(vec![Transaction::with_senders(["Someone"])])
        }
    }

    struct StalledClient;

    #[async_trait]
    impl LedgerHistoryClient for StalledClient {
        async fn fetch_history(
            &self,
            _address: &Address,
            _limit: u32,
        ) -> Result<Vec<Transaction>, HistoryFetchError> {
            sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            attempt_timeout_ms: 1_000,
        }
    }

    fn flaky(failures: u32, status: u16) -> (FlakyClient, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (FlakyClient { calls: calls.clone(), failures, status }, calls)
    }

    fn wallet() -> Address {
        Address::new("Wallet").unwrap()
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay_ms(1), 250);
        assert_eq!(policy.backoff_delay_ms(2), 500);
        assert_eq!(policy.backoff_delay_ms(3), 1_000);
        assert_eq!(policy.backoff_delay_ms(4), 2_000);
        assert_eq!(policy.backoff_delay_ms(64), 2_000);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let (inner, calls) = flaky(2, 503);
        let client = RetryingHistoryClient::new(inner, fast_policy(3));

        let txs = client.fetch_history(&wallet(), 2).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (inner, calls) = flaky(10, 500);
        let client = RetryingHistoryClient::new(inner, fast_policy(3));

        let err = client.fetch_history(&wallet(), 2).await.unwrap_err();
        assert!(matches!(err, HistoryFetchError::Status { status: 500, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (inner, calls) = flaky(10, 403);
        let client = RetryingHistoryClient::new(inner, fast_policy(5));

        assert!(client.fetch_history(&wallet(), 2).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_applies() {
        let policy = RetryPolicy { attempt_timeout_ms: 100, ..fast_policy(2) };
        let client = RetryingHistoryClient::new(StalledClient, policy);

        let err = client.fetch_history(&wallet(), 2).await.unwrap_err();
        assert!(matches!(err, HistoryFetchError::Timeout(d) if d == Duration::from_millis(100)));
    }
}
