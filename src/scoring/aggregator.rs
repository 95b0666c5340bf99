//! Reduces a page of classified transactions into score inputs

use crate::core::{Address, ClassifiedCount, ScoreInputs, Transaction};

use super::classifier::classify;

/// Counts sent and received transactions for `address`
pub fn count(address: &Address, txs: &[Transaction]) -> ClassifiedCount {
    txs.iter().fold(ClassifiedCount::default(), |mut counts, tx| {
        counts.record(classify(address, tx));
        counts
    })
}

/// Turns directional counts into percentages, or the undefined sentinel
/// when there is nothing to divide by.
pub fn percentages(counts: ClassifiedCount) -> ScoreInputs {
    let total = counts.total();
    if total == 0 {
        return ScoreInputs::Undefined;
    }

    let total = f64::from(total);
    ScoreInputs::Defined {
        sent_pct: f64::from(counts.sent) / total * 100.0,
        received_pct: f64::from(counts.received) / total * 100.0,
    }
}

pub fn aggregate(address: &Address, txs: &[Transaction]) -> ScoreInputs {
    percentages(count(address, txs))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "Wa11etSubject1111111111111111111111111111111";

    fn sent() -> Transaction {
        Transaction::with_senders([WALLET])
    }

    fn received() -> Transaction {
        Transaction::with_senders(["Counterparty22222222222222222222222222222222"])
    }

    fn wallet() -> Address {
        Address::new(WALLET).unwrap()
    }

    #[test]
    fn test_counts_are_conserved() {
        let txs = vec![
            sent(),
            received(),
            Transaction::with_senders(Vec::<String>::new()),
            sent(),
            received(),
            received(),
        ];

        let counts = count(&wallet(), &txs);
        assert_eq!(counts.total() as usize, txs.len());
        assert_eq!(counts, ClassifiedCount { sent: 2, received: 4 });
    }

    #[test]
    fn test_empty_history_is_undefined() {
        let inputs = aggregate(&wallet(), &[]);
        assert!(inputs.is_undefined());
    }

    #[test]
    fn test_three_sent_one_received() {
        let txs = vec![sent(), sent(), received(), sent()];
        assert_eq!(
            aggregate(&wallet(), &txs),
            ScoreInputs::Defined { sent_pct: 75.0, received_pct: 25.0 }
        );
    }

    #[test]
    fn test_all_received() {
        let txs: Vec<Transaction> = (0..5).map(|_| received()).collect();
        assert_eq!(
            aggregate(&wallet(), &txs),
            ScoreInputs::Defined { sent_pct: 0.0, received_pct: 100.0 }
        );
    }

    #[test]
    fn test_percentages_stay_in_range() {
        for sent in 0..6u32 {
            for received in 0..6u32 {
                match percentages(ClassifiedCount { sent, received }) {
                    ScoreInputs::Defined { sent_pct, received_pct } => {
                        assert!((0.0..=100.0).contains(&sent_pct));
                        assert!((0.0..=100.0).contains(&received_pct));
                        assert!((sent_pct + received_pct - 100.0).abs() < 1e-9);
                    }
                    ScoreInputs::Undefined => assert_eq!(sent + received, 0),
                }
            }
        }
    }
}
