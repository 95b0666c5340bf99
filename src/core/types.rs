//! Core wallet and transaction types shared by the ledger client and the scoring pipeline

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised when constructing an [`Address`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("wallet address is empty")]
    Empty,
}

/// Opaque wallet address on the ledger.
///
/// The value is only trimmed and checked for emptiness. It is compared
/// byte-for-byte against action senders and never decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AddressError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One historical ledger transaction as returned by the history API.
///
/// Indexer metadata is kept as raw JSON. Its shape varies between API
/// versions and has no bearing on classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction type label from the indexer (e.g. "SOL_TRANSFER")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Value>,
    /// Ordered sub-events; only the first one matters for classification
    pub actions: Vec<Action>,
}

impl Transaction {
    /// Transaction with the given action senders, in order
    pub fn with_senders<I, S>(senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tx_type: None,
            timestamp: None,
            signatures: None,
            actions: senders
                .into_iter()
                .map(|sender| Action {
                    action_type: None,
                    info: ActionInfo { sender: sender.into() },
                })
                .collect(),
        }
    }

    pub fn first_sender(&self) -> Option<&str> {
        self.actions.first().map(|action| action.info.sender.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<Value>,
    pub info: ActionInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub sender: String,
}

/// Direction of a transaction relative to the scored wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Sent,
    Received,
}

/// Directional counts over one page of history.
///
/// `sent + received` always equals the number of transactions counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedCount {
    pub sent: u32,
    pub received: u32,
}

impl ClassifiedCount {
    pub fn record(&mut self, direction: Direction) {
        match direction {
            Direction::Sent => self.sent += 1,
            Direction::Received => self.received += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.sent + self.received
    }
}

/// Percentages fed into the score formula.
///
/// `Undefined` marks an empty history so the formula never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreInputs {
    Defined { sent_pct: f64, received_pct: f64 },
    Undefined,
}

impl ScoreInputs {
    pub fn is_undefined(&self) -> bool {
        matches!(self, ScoreInputs::Undefined)
    }
}

/// Final on-chain credit score, finite and rounded to two decimals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditScore(f64);

impl CreditScore {
    /// Wraps an already rounded value. Non-finite input collapses to `0.0`.
    pub(crate) fn from_rounded(value: f64) -> Self {
        if value.is_finite() {
            Self(value)
        } else {
            Self(0.0)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for CreditScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_rejects_blank() {
        assert_eq!(Address::new(""), Err(AddressError::Empty));
        assert_eq!(Address::new("   "), Err(AddressError::Empty));
    }

    #[test]
    fn test_address_is_trimmed_but_not_parsed() {
        let address = Address::new("  not-base58-at-all ").unwrap();
        assert_eq!(address.as_str(), "not-base58-at-all");
    }

    #[test]
    fn test_transaction_decodes_shyft_shape() {
        let raw = serde_json::json!({
            "timestamp": "2024-03-01T10:00:00.000Z",
            "fee": 0.000005,
            "fee_payer": "Alice111",
            "signatures": ["5sig"],
            "type": "SOL_TRANSFER",
            "status": "Success",
            "actions": [
                { "type": "SOL_TRANSFER", "info": { "sender": "Alice111", "receiver": "Bob222", "amount": 0.5 } }
            ]
        });

        let tx: Transaction = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.tx_type, Some(Value::from("SOL_TRANSFER")));
        assert_eq!(tx.signatures, Some(serde_json::json!(["5sig"])));
        assert_eq!(tx.first_sender(), Some("Alice111"));
    }

    #[test]
    fn test_metadata_of_any_shape_is_accepted() {
        let raw = serde_json::json!({
            "timestamp": 1709287200,
            "signatures": null,
            "type": { "name": "SOL_TRANSFER" },
            "actions": [ { "type": 7, "info": { "sender": "Alice111" } } ]
        });

        let tx: Transaction = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.timestamp, Some(Value::from(1709287200)));
        assert_eq!(tx.signatures, None);
        assert_eq!(tx.first_sender(), Some("Alice111"));
    }

    #[test]
    fn test_transaction_without_actions_field_is_rejected() {
        let raw = serde_json::json!({ "type": "UNKNOWN" });
        assert!(serde_json::from_value::<Transaction>(raw).is_err());
    }

    #[test]
    fn test_credit_score_display_keeps_two_decimals() {
        assert_eq!(CreditScore::from_rounded(80.6).to_string(), "80.60");
        assert_eq!(CreditScore::from_rounded(f64::NAN).value(), 0.0);
    }
}
