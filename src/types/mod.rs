//! Type definitions for the fraud scoring service

pub mod prediction;
pub mod transaction;

pub use prediction::{Attribution, AttributionSet, PredictionResult, RiskTier};
pub use transaction::{TransactionRecord, TransactionType};
