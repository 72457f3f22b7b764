//! Shared fixtures for integration tests

#![allow(dead_code)]

use fraud_scoring_service::{
    config::AppConfig,
    error::{Result, ScoringError},
    models::ModelLoader,
    AttributionEngine, CategoricalEncoder, ModelScore, ScoringModel, ScoringPipeline,
    TransactionRecord,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type ScoreFn = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Scoring model stub computing a probability from each encoded row
pub struct StubModel {
    score: ScoreFn,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Vec<f64>>>,
}

impl StubModel {
    pub fn new(score: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            score: Box::new(score),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn constant(probability: f64) -> Self {
        Self::new(move |_| probability)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScoringModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<ModelScore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().extend(features.iter().cloned());
        Ok(features
            .iter()
            .map(|row| {
                let p = (self.score)(row);
                ModelScore::new(u8::from(p > 0.5), p)
            })
            .collect())
    }
}

/// Attribution stub returning fixed impacts for every row
pub struct StubExplainer {
    impacts: Vec<f64>,
    pub calls: AtomicUsize,
}

impl StubExplainer {
    pub fn new(impacts: Vec<f64>) -> Self {
        Self {
            impacts,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AttributionEngine for StubExplainer {
    fn explain_batch(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.impacts.clone(); features.len()])
    }
}

/// Attribution engine that always fails
pub struct FailingExplainer;

impl AttributionEngine for FailingExplainer {
    fn explain_batch(&self, _features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        Err(ScoringError::Model("explainer backend unavailable".to_string()))
    }
}

/// Impacts aligned with the seven transaction feature columns
pub fn sample_impacts() -> Vec<f64> {
    // step, type, amount, oldbalanceOrg, newbalanceOrig, oldbalanceDest, newbalanceDest
    vec![0.01, 0.3, 0.5, -0.8, 0.2, 0.0, -0.05]
}

/// Encoder fitted on a small sample that never contains DEBIT
pub fn fitted_encoder() -> Arc<CategoricalEncoder> {
    let sample: Vec<TransactionRecord> = TransactionRecord::parse_batch(&json!([
        transaction(1, "PAYMENT", 9839.64, (170136.0, 160296.36), (0.0, 0.0)),
        transaction(1, "TRANSFER", 181.0, (181.0, 0.0), (0.0, 0.0)),
        transaction(1, "CASH_OUT", 181.0, (181.0, 0.0), (21182.0, 0.0)),
        transaction(2, "CASH_IN", 5000.0, (100.0, 5100.0), (7000.0, 2000.0)),
    ]))
    .unwrap();

    let mut encoder = CategoricalEncoder::new(TransactionRecord::CATEGORICAL_COLUMNS);
    let rows: Vec<_> = sample.iter().map(TransactionRecord::feature_row).collect();
    encoder.fit(&rows).unwrap();
    Arc::new(encoder)
}

pub fn stub_pipeline(model: Arc<StubModel>, explainer: Arc<dyn AttributionEngine>) -> ScoringPipeline {
    ScoringPipeline::new(fitted_encoder(), model, explainer).unwrap()
}

/// Transaction in wire format
pub fn transaction(
    step: u64,
    kind: &str,
    amount: f64,
    orig: (f64, f64),
    dest: (f64, f64),
) -> Value {
    json!({
        "step": step,
        "type": kind,
        "amount": amount,
        "nameOrig": format!("C{}", 1000 + step),
        "oldbalanceOrg": orig.0,
        "newbalanceOrig": orig.1,
        "nameDest": format!("M{}", 2000 + step),
        "oldbalanceDest": dest.0,
        "newbalanceDest": dest.1
    })
}

/// Origin fully drained into an empty destination
pub fn drained_transfer() -> Value {
    transaction(1, "TRANSFER", 100000.0, (100000.0, 0.0), (0.0, 0.0))
}

/// Pipeline built from the artifacts shipped in `models/`
pub fn bundled_pipeline() -> ScoringPipeline {
    let mut config = AppConfig::default();
    config.models.models_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("models")
        .to_string_lossy()
        .into_owned();
    ModelLoader::new(&config.models)
        .load_pipeline(&config.detection)
        .unwrap()
}
