//! Artifact loader for the encoder and scoring model

use crate::config::{DetectionConfig, ModelsConfig};
use crate::encoder::CategoricalEncoder;
use crate::models::forest::RandomForest;
use crate::pipeline::ScoringPipeline;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Loads persisted artifacts once at startup
pub struct ModelLoader {
    models_dir: PathBuf,
    model_file: String,
    encoder_file: String,
}

impl ModelLoader {
    /// Create a loader from configuration
    pub fn new(config: &ModelsConfig) -> Self {
        Self {
            models_dir: PathBuf::from(&config.models_dir),
            model_file: config.model_file.clone(),
            encoder_file: config.encoder_file.clone(),
        }
    }

    fn model_path(&self) -> PathBuf {
        self.models_dir.join(&self.model_file)
    }

    fn encoder_path(&self) -> PathBuf {
        self.models_dir.join(&self.encoder_file)
    }

    /// Load the fitted encoder
    pub fn load_encoder(&self) -> Result<CategoricalEncoder> {
        let path = self.encoder_path();
        let json = read_artifact(&path)?;
        let encoder = CategoricalEncoder::from_json(&json)
            .with_context(|| format!("Failed to parse encoder from {}", path.display()))?;

        info!(path = %path.display(), fitted = encoder.is_fitted(), "Encoder loaded");
        Ok(encoder)
    }

    /// Load the forest model
    pub fn load_model(&self) -> Result<RandomForest> {
        let path = self.model_path();
        let json = read_artifact(&path)?;
        let forest = RandomForest::from_json(&json)
            .with_context(|| format!("Failed to parse model from {}", path.display()))?;

        info!(
            path = %path.display(),
            trees = forest.tree_count(),
            features = forest.feature_names().len(),
            "Model loaded successfully"
        );
        Ok(forest)
    }

    /// Load both artifacts and assemble the scoring pipeline.
    ///
    /// The model must index features in exactly the encoder's column order.
    pub fn load_pipeline(&self, detection: &DetectionConfig) -> Result<ScoringPipeline> {
        detection.validate()?;
        let encoder = self.load_encoder()?;
        let forest = Arc::new(self.load_model()?);

        let columns = encoder
            .feature_names()
            .context("Encoder artifact is not fitted")?;
        if columns != forest.feature_names() {
            bail!(
                "Model features {:?} do not match encoder columns {:?}",
                forest.feature_names(),
                columns
            );
        }

        let pipeline = ScoringPipeline::new(Arc::new(encoder), forest.clone(), forest)?
            .with_classifier(detection.classifier()?)
            .with_top_k(detection.top_k);

        info!(
            model = %pipeline.model_name(),
            review_threshold = pipeline.classifier().review_threshold(),
            fraud_threshold = pipeline.classifier().fraud_threshold(),
            top_k = detection.top_k,
            "Scoring pipeline ready"
        );
        Ok(pipeline)
    }
}

fn read_artifact(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read artifact {}", path.display()))
}
