//! On-chain credit scoring pipeline

pub mod aggregator;
pub mod classifier;
pub mod formula;
pub mod service;

pub use aggregator::aggregate;
pub use classifier::classify;
pub use formula::compute_score;
pub use service::{CreditScoreService, ScoreReport, ScoringError};
