mod common;

use common::*;
use fraud_scoring_service::{
    types::{prediction::RiskTier, transaction::EXPECTED_ARRAY_MESSAGE},
    ScoringError, ScoringPipeline, TransactionRecord,
};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_drained_transfer_scored_as_fraud() {
    let model = Arc::new(StubModel::constant(0.95));
    let pipeline = stub_pipeline(model, Arc::new(StubExplainer::new(sample_impacts())));

    let results = pipeline.predict_json(&json!([drained_transfer()])).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].prediction, 1);
    assert_eq!(results[0].fraud_probability, 95.0);
    assert_eq!(results[0].status, RiskTier::Fraud);

    let explanation: Vec<(&str, f64)> = results[0]
        .explanation
        .iter()
        .map(|a| (a.feature.as_str(), a.impact))
        .collect();
    assert_eq!(
        explanation,
        vec![("oldbalanceOrg", -0.8), ("amount", 0.5), ("type", 0.3)]
    );
}

#[test]
fn test_batch_order_preserved() {
    // the stub reads the probability off the step column
    let model = Arc::new(StubModel::new(|row| row[0] / 100.0));
    let pipeline = stub_pipeline(model, Arc::new(StubExplainer::new(sample_impacts())));

    let steps = [10, 95, 60, 30, 90];
    let payload: Vec<_> = steps
        .iter()
        .map(|&step| transaction(step, "PAYMENT", 10.0, (10.0, 0.0), (0.0, 0.0)))
        .collect();

    let results = pipeline.predict_json(&json!(payload)).unwrap();

    let probabilities: Vec<f64> = results.iter().map(|r| r.fraud_probability).collect();
    assert_eq!(probabilities, vec![10.0, 95.0, 60.0, 30.0, 90.0]);

    let tiers: Vec<RiskTier> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        tiers,
        vec![
            RiskTier::Legitimate,
            RiskTier::Fraud,
            RiskTier::ManualReview,
            RiskTier::Legitimate,
            RiskTier::Fraud,
        ]
    );
}

#[test]
fn test_model_and_explainer_called_once_per_batch() {
    let model = Arc::new(StubModel::constant(0.2));
    let explainer = Arc::new(StubExplainer::new(sample_impacts()));
    let pipeline = stub_pipeline(model.clone(), explainer.clone());

    let payload: Vec<_> = (0..25).map(|_| drained_transfer()).collect();
    let results = pipeline.predict_json(&json!(payload)).unwrap();

    assert_eq!(results.len(), 25);
    assert_eq!(model.calls(), 1);
    assert_eq!(explainer.calls(), 1);
}

#[test]
fn test_identifiers_never_reach_the_model() {
    let model = Arc::new(StubModel::constant(0.2));
    let pipeline = stub_pipeline(model.clone(), Arc::new(StubExplainer::new(sample_impacts())));

    pipeline.predict_json(&json!([drained_transfer()])).unwrap();

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen[0].len(), TransactionRecord::FEATURE_COLUMNS.len());
    // step, type code, amount, balances
    assert_eq!(seen[0], vec![1.0, 2.0, 100000.0, 100000.0, 0.0, 0.0, 0.0]);
    assert_eq!(
        pipeline.feature_names().unwrap(),
        TransactionRecord::FEATURE_COLUMNS
    );
}

#[test]
fn test_unseen_category_scored_with_unknown_code() {
    let model = Arc::new(StubModel::constant(0.4));
    let pipeline = stub_pipeline(model.clone(), Arc::new(StubExplainer::new(sample_impacts())));

    let debit = transaction(3, "DEBIT", 50.0, (500.0, 450.0), (0.0, 50.0));
    let results = pipeline.predict_json(&json!([debit])).unwrap();

    assert_eq!(results[0].status, RiskTier::Legitimate);
    assert_eq!(model.seen.lock().unwrap()[0][1], 0.0);
}

#[test]
fn test_malformed_row_fails_whole_batch() {
    let model = Arc::new(StubModel::constant(0.95));
    let explainer = Arc::new(StubExplainer::new(sample_impacts()));
    let pipeline = stub_pipeline(model.clone(), explainer.clone());

    let mut rows: Vec<_> = (0..5).map(|_| drained_transfer()).collect();
    rows[2].as_object_mut().unwrap().remove("amount");

    let err = pipeline.predict_json(&json!(rows)).unwrap_err();

    assert!(matches!(err, ScoringError::Validation(_)));
    assert!(err.to_string().contains("row 2"));
    assert_eq!(model.calls(), 0);
    assert_eq!(explainer.calls(), 0);
}

#[test]
fn test_non_array_payload_rejected() {
    let pipeline = stub_pipeline(
        Arc::new(StubModel::constant(0.1)),
        Arc::new(StubExplainer::new(sample_impacts())),
    );

    let err = pipeline.predict_json(&drained_transfer()).unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(err.to_string(), EXPECTED_ARRAY_MESSAGE);
}

#[test]
fn test_explainer_failure_surfaces_message() {
    let pipeline = stub_pipeline(Arc::new(StubModel::constant(0.1)), Arc::new(FailingExplainer));

    let err = pipeline.predict_json(&json!([drained_transfer()])).unwrap_err();

    assert!(!err.is_client_error());
    assert!(err.to_string().contains("explainer backend unavailable"));
}

#[test]
fn test_wrong_width_attributions_rejected() {
    let pipeline = stub_pipeline(
        Arc::new(StubModel::constant(0.1)),
        Arc::new(StubExplainer::new(vec![0.1, 0.2])),
    );

    let err = pipeline.predict_json(&json!([drained_transfer()])).unwrap_err();
    assert!(matches!(err, ScoringError::Model(_)));
}

#[test]
fn test_empty_batch_skips_model() {
    let model = Arc::new(StubModel::constant(0.1));
    let pipeline = stub_pipeline(model.clone(), Arc::new(StubExplainer::new(sample_impacts())));

    assert!(pipeline.predict_json(&json!([])).unwrap().is_empty());
    assert_eq!(model.calls(), 0);
}

#[test]
fn test_bundled_forest_flags_drained_transfer() {
    let pipeline = bundled_pipeline();

    let legit = transaction(1, "PAYMENT", 9839.64, (170136.0, 160296.36), (0.0, 0.0));
    let results = pipeline
        .predict_json(&json!([drained_transfer(), legit]))
        .unwrap();

    assert_eq!(results[0].prediction, 1);
    assert_eq!(results[0].fraud_probability, 95.0);
    assert_eq!(results[0].status, RiskTier::Fraud);

    let features: Vec<&str> = results[0]
        .explanation
        .iter()
        .map(|a| a.feature.as_str())
        .collect();
    assert_eq!(features, vec!["type", "newbalanceOrig", "newbalanceDest"]);
    assert!((results[0].explanation[0].impact - 0.2167).abs() < 1e-9);

    assert_eq!(results[1].prediction, 0);
    assert_eq!(results[1].fraud_probability, 5.67);
    assert_eq!(results[1].status, RiskTier::Legitimate);
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_shared_pipeline_scores_concurrently() {
    assert_send_sync::<ScoringPipeline>();

    let pipeline = Arc::new(bundled_pipeline());
    let legit = transaction(1, "PAYMENT", 9839.64, (170136.0, 160296.36), (0.0, 0.0));
    let payload = json!([drained_transfer(), legit]);
    let expected = pipeline.predict_json(&payload).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                let payload = &payload;
                scope.spawn(move || {
                    (0..25)
                        .map(|_| pipeline.predict_json(payload).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for results in handle.join().unwrap() {
                assert_eq!(results, expected);
            }
        }
    });
}
