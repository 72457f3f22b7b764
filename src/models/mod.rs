//! Scoring model and attribution engine contracts, plus the bundled tree
//! ensemble that implements both.

pub mod forest;
pub mod loader;

pub use forest::RandomForest;
pub use loader::ModelLoader;

use crate::error::Result;

/// Label and fraud-class probability produced for one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelScore {
    /// Predicted class (1 = fraud)
    pub label: u8,
    /// Probability of the fraud class in [0, 1]
    pub probability: f64,
}

impl ModelScore {
    pub fn new(label: u8, probability: f64) -> Self {
        Self { label, probability }
    }
}

/// Opaque binary classifier over encoded feature vectors.
///
/// Called once per batch; must return exactly one score per input row.
pub trait ScoringModel: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<ModelScore>>;
}

/// Opaque explainer producing one signed contribution per feature column.
///
/// Called once per batch over the same matrix given to the scoring model.
pub trait AttributionEngine: Send + Sync {
    fn explain_batch(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}
