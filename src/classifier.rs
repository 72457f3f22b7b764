//! Probability to risk tier classification

use crate::error::{Result, ScoringError};
use crate::types::prediction::RiskTier;
use serde::{Deserialize, Serialize};

/// Lower edges of the review and fraud tiers.
///
/// Tiers are half-open on the upper side: `[0, review)` is Legitimate,
/// `[review, fraud)` is ManualReview and `[fraud, 1]` is Fraud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskClassifier {
    review_threshold: f64,
    fraud_threshold: f64,
}

impl RiskClassifier {
    pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.5;
    pub const DEFAULT_FRAUD_THRESHOLD: f64 = 0.9;

    /// Create a classifier with custom tier edges
    pub fn new(review_threshold: f64, fraud_threshold: f64) -> Result<Self> {
        let ordered = 0.0 <= review_threshold
            && review_threshold <= fraud_threshold
            && fraud_threshold <= 1.0;
        if !ordered {
            return Err(ScoringError::Validation(format!(
                "risk thresholds must satisfy 0 <= review ({}) <= fraud ({}) <= 1",
                review_threshold, fraud_threshold
            )));
        }
        Ok(Self {
            review_threshold,
            fraud_threshold,
        })
    }

    /// Map a fraud probability to its tier
    pub fn classify(&self, probability: f64) -> RiskTier {
        if probability >= self.fraud_threshold {
            RiskTier::Fraud
        } else if probability >= self.review_threshold {
            RiskTier::ManualReview
        } else {
            RiskTier::Legitimate
        }
    }

    pub fn review_threshold(&self) -> f64 {
        self.review_threshold
    }

    pub fn fraud_threshold(&self) -> f64 {
        self.fraud_threshold
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self {
            review_threshold: Self::DEFAULT_REVIEW_THRESHOLD,
            fraud_threshold: Self::DEFAULT_FRAUD_THRESHOLD,
        }
    }
}
