//! Directional classification of ledger transactions

use crate::core::{Address, Direction, Transaction};

/// Labels a transaction as sent or received from the wallet's point of view.
///
/// Only the first action is inspected: the transaction counts as `Sent` when
/// that action's sender is the wallet. Everything else, including
/// transactions with no actions, counts as `Received`.
pub fn classify(address: &Address, tx: &Transaction) -> Direction {
    match tx.first_sender() {
        Some(sender) if sender == address.as_str() => Direction::Sent,
        _ => Direction::Received,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> Address {
        Address::new("Wa11etSubject1111111111111111111111111111111").unwrap()
    }

    #[test]
    fn test_first_action_from_wallet_is_sent() {
        let tx = Transaction::with_senders([wallet().as_str()]);
        assert_eq!(classify(&wallet(), &tx), Direction::Sent);
    }

    #[test]
    fn test_empty_actions_is_received() {
        let tx = Transaction::with_senders(Vec::<String>::new());
        assert_eq!(classify(&wallet(), &tx), Direction::Received);
    }

    #[test]
    fn test_only_first_action_counts() {
        // Wallet sends in the second action only
        let tx = Transaction::with_senders(["SomeoneElse", wallet().as_str()]);
        assert_eq!(classify(&wallet(), &tx), Direction::Received);

        let tx = Transaction::with_senders([wallet().as_str(), "SomeoneElse"]);
        assert_eq!(classify(&wallet(), &tx), Direction::Sent);
    }

    #[test]
    fn test_sender_comparison_is_exact() {
        let lowercase = wallet().as_str().to_lowercase();
        let tx = Transaction::with_senders([lowercase]);
        assert_eq!(classify(&wallet(), &tx), Direction::Received);
    }
}
