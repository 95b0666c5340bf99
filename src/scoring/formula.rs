//! Weighted credit score formula
//!
//! score = a * BH + b * (TH + CD) + c, with the borrower history (BH = 80) and
//! collateral diversity (CD = 20) terms fixed and TH taken from the wallet's
//! sent/received balance.

use crate::core::{CreditScore, ScoreInputs};

/// Weight of the borrower history term
pub const BORROWER_HISTORY_WEIGHT: f64 = 0.55;
/// Fixed borrower history score
pub const BORROWER_HISTORY_SCORE: f64 = 80.0;
/// Weight of the combined transaction history + collateral diversity term
pub const HISTORY_WEIGHT: f64 = 0.33;
/// Fixed collateral diversity score
pub const COLLATERAL_DIVERSITY_SCORE: f64 = 20.0;
/// Constant offset adjusting the score range
pub const SCORE_OFFSET: f64 = 30.0;

/// Transaction history score in `[-1, 1]`. Undefined or non-finite input maps to `0`.
pub fn history_score(inputs: &ScoreInputs) -> f64 {
    match *inputs {
        ScoreInputs::Defined { sent_pct, received_pct } => {
            let score = (sent_pct - received_pct) / 100.0;
            if score.is_finite() {
                score
            } else {
                0.0
            }
        }
        ScoreInputs::Undefined => 0.0,
    }
}

/// Unrounded score. Operation order is fixed so results match bit-for-bit.
pub fn raw_score(history_score: f64) -> f64 {
    BORROWER_HISTORY_WEIGHT * BORROWER_HISTORY_SCORE
        + HISTORY_WEIGHT * (history_score + COLLATERAL_DIVERSITY_SCORE)
        + SCORE_OFFSET
}

/// Rounds to two decimals, half away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn compute_score(inputs: &ScoreInputs) -> CreditScore {
    CreditScore::from_rounded(round2(raw_score(history_score(inputs))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_inputs_use_fallback() {
        let score = compute_score(&ScoreInputs::Undefined);
        assert_eq!(score.value(), 80.6);
    }

    #[test]
    fn test_three_sent_one_received() {
        let inputs = ScoreInputs::Defined { sent_pct: 75.0, received_pct: 25.0 };
        assert_eq!(history_score(&inputs), 0.5);
        assert!((raw_score(0.5) - 80.765).abs() < 1e-9);
        assert_eq!(compute_score(&inputs).value(), 80.77);
    }

    #[test]
    fn test_all_received() {
        let inputs = ScoreInputs::Defined { sent_pct: 0.0, received_pct: 100.0 };
        assert_eq!(history_score(&inputs), -1.0);
        assert_eq!(compute_score(&inputs).value(), 80.27);
    }

    #[test]
    fn test_all_sent() {
        let inputs = ScoreInputs::Defined { sent_pct: 100.0, received_pct: 0.0 };
        // 44 + 0.33 * 21 + 30
        assert_eq!(compute_score(&inputs).value(), 80.93);
    }

    #[test]
    fn test_nan_percentages_are_normalised() {
        let inputs = ScoreInputs::Defined { sent_pct: f64::NAN, received_pct: f64::NAN };
        assert_eq!(compute_score(&inputs), compute_score(&ScoreInputs::Undefined));
    }

    #[test]
    fn test_deterministic() {
        let inputs = ScoreInputs::Defined { sent_pct: 33.333333333333336, received_pct: 66.66666666666667 };
        let first = compute_score(&inputs);
        for _ in 0..10 {
            assert_eq!(compute_score(&inputs), first);
        }
    }

    #[test]
    fn test_round2_is_half_away_from_zero() {
        assert_eq!(round2(8.125), 8.13);
        assert_eq!(round2(-8.125), -8.13);
        assert_eq!(round2(80.6), 80.6);
    }
}
