//! Fraud Scoring Service Library
//!
//! Scores financial transactions for fraud risk and explains each score:
//! categorical encoding with unknown-value fallback, batch model scoring,
//! risk tiering and top-k feature attribution.

pub mod api;
pub mod attribution;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod types;

pub use classifier::RiskClassifier;
pub use config::AppConfig;
pub use encoder::CategoricalEncoder;
pub use error::ScoringError;
pub use models::{AttributionEngine, ModelScore, RandomForest, ScoringModel};
pub use pipeline::ScoringPipeline;
pub use types::{prediction::PredictionResult, transaction::TransactionRecord};
