//! Batch scoring pipeline.
//!
//! Encodes a batch of transactions once, calls the scoring model and the
//! attribution engine once each over the encoded matrix, then classifies and
//! explains every row. Results come back in input order, one per record; any
//! failure aborts the whole batch.

use crate::attribution::{top_k, DEFAULT_TOP_K};
use crate::classifier::RiskClassifier;
use crate::encoder::{CategoricalEncoder, FeatureRow};
use crate::error::{Result, ScoringError};
use crate::models::{AttributionEngine, ModelScore, ScoringModel};
use crate::types::prediction::PredictionResult;
use crate::types::transaction::TransactionRecord;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Scores and explains transaction batches.
///
/// Holds only read-only references to its collaborators and can be shared
/// across request handlers.
pub struct ScoringPipeline {
    encoder: Arc<CategoricalEncoder>,
    model: Arc<dyn ScoringModel>,
    explainer: Arc<dyn AttributionEngine>,
    classifier: RiskClassifier,
    top_k: usize,
}

impl ScoringPipeline {
    /// Create a pipeline over a fitted encoder.
    ///
    /// Fails with `NotFitted` if the encoder has no fitted mapping.
    pub fn new(
        encoder: Arc<CategoricalEncoder>,
        model: Arc<dyn ScoringModel>,
        explainer: Arc<dyn AttributionEngine>,
    ) -> Result<Self> {
        encoder.feature_names()?;
        Ok(Self {
            encoder,
            model,
            explainer,
            classifier: RiskClassifier::default(),
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Use custom tier thresholds
    pub fn with_classifier(mut self, classifier: RiskClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Report `k` attributions per row
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Feature columns in encoded order
    pub fn feature_names(&self) -> Result<&[String]> {
        self.encoder.feature_names()
    }

    /// Validate a raw JSON payload and score it
    pub fn predict_json(&self, payload: &serde_json::Value) -> Result<Vec<PredictionResult>> {
        let transactions = TransactionRecord::parse_batch(payload)?;
        self.predict_batch(&transactions)
    }

    /// Score a batch of validated transactions
    pub fn predict_batch(&self, transactions: &[TransactionRecord]) -> Result<Vec<PredictionResult>> {
        if transactions.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let feature_names = self.encoder.feature_names()?;

        // identifiers never reach the encoder
        let rows: Vec<FeatureRow<'_>> = transactions
            .iter()
            .map(TransactionRecord::feature_row)
            .collect();
        let matrix = self.encoder.transform(&rows)?;

        let scores = self.model.predict_batch(&matrix)?;
        check_scores(&scores, matrix.len())?;

        let impacts = self.explainer.explain_batch(&matrix)?;
        check_impacts(&impacts, matrix.len(), feature_names.len())?;

        let results: Vec<PredictionResult> = scores
            .iter()
            .zip(&impacts)
            .map(|(score, row_impacts)| {
                PredictionResult::new(
                    score.label,
                    score.probability,
                    self.classifier.classify(score.probability),
                    top_k(feature_names, row_impacts, self.top_k),
                )
            })
            .collect();

        debug!(
            model = %self.model.name(),
            rows = results.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Pipeline batch complete"
        );

        Ok(results)
    }
}

fn check_scores(scores: &[ModelScore], rows: usize) -> Result<()> {
    if scores.len() != rows {
        return Err(ScoringError::Model(format!(
            "scoring model returned {} results for {} rows",
            scores.len(),
            rows
        )));
    }
    for (i, score) in scores.iter().enumerate() {
        if score.label > 1 {
            return Err(ScoringError::Model(format!(
                "row {}: label {} is not 0 or 1",
                i, score.label
            )));
        }
        if !(0.0..=1.0).contains(&score.probability) {
            return Err(ScoringError::Model(format!(
                "row {}: probability {} outside [0, 1]",
                i, score.probability
            )));
        }
    }
    Ok(())
}

fn check_impacts(impacts: &[Vec<f64>], rows: usize, features: usize) -> Result<()> {
    if impacts.len() != rows {
        return Err(ScoringError::Model(format!(
            "attribution engine returned {} rows for {} rows",
            impacts.len(),
            rows
        )));
    }
    for (i, row) in impacts.iter().enumerate() {
        if row.len() != features {
            return Err(ScoringError::Model(format!(
                "row {}: {} attributions for {} features",
                i,
                row.len(),
                features
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ScoringError::Model(format!(
                "row {}: non-finite attribution value",
                i
            )));
        }
    }
    Ok(())
}
