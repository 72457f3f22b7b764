//! Scoring result data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete risk tier derived from the fraud probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Legitimate")]
    Legitimate,
    #[serde(rename = "Manual Review")]
    ManualReview,
    #[serde(rename = "Fraud")]
    Fraud,
}

impl RiskTier {
    /// All tiers, lowest risk first
    pub const ALL: [RiskTier; 3] = [RiskTier::Legitimate, RiskTier::ManualReview, RiskTier::Fraud];

    /// Human-readable label, identical to the wire representation
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Legitimate => "Legitimate",
            RiskTier::ManualReview => "Manual Review",
            RiskTier::Fraud => "Fraud",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One feature's signed contribution to a row's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Feature column name
    pub feature: String,
    /// Signed push toward (+) or away from (-) fraud, rounded to 4 decimals
    pub impact: f64,
}

impl Attribution {
    pub fn new(feature: impl Into<String>, impact: f64) -> Self {
        Self {
            feature: feature.into(),
            impact,
        }
    }
}

/// Top contributing features of a row, strongest first
pub type AttributionSet = Vec<Attribution>;

/// Scoring outcome for one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Model label (1 = fraud)
    pub prediction: u8,

    /// Fraud probability as a percentage in [0, 100], rounded to 2 decimals
    pub fraud_probability: f64,

    /// Risk tier
    pub status: RiskTier,

    /// Top contributing features
    pub explanation: AttributionSet,
}

impl PredictionResult {
    /// Assemble a result from a raw probability in [0, 1]
    pub fn new(prediction: u8, probability: f64, status: RiskTier, explanation: AttributionSet) -> Self {
        Self {
            prediction,
            fraud_probability: round_to(probability * 100.0, 2),
            status,
            explanation,
        }
    }
}

/// Round half away from zero to `places` decimals
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
