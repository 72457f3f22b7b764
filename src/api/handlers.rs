//! Request handlers

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::metrics::MetricsSnapshot;
use crate::types::prediction::PredictionResult;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, info_span};
use uuid::Uuid;

/// Score a JSON array of transactions
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Vec<PredictionResult>>> {
    let Json(payload) = payload.map_err(|rejection| {
        state.metrics.record_failure();
        ApiError::Validation(rejection.body_text())
    })?;

    let batch_id = Uuid::new_v4();
    let span = info_span!("predict", batch_id = %batch_id);
    let task_span = span.clone();
    let pipeline = state.pipeline.clone();
    let start = Instant::now();

    // scoring is CPU bound
    let outcome = tokio::task::spawn_blocking(move || {
        let _entered = task_span.enter();
        pipeline.predict_json(&payload)
    })
    .await
    .map_err(|e| {
        state.metrics.record_failure();
        ApiError::Internal(format!("Scoring task failed: {}", e))
    })?;

    span.in_scope(|| match outcome {
        Ok(results) => {
            let elapsed = start.elapsed();
            state.metrics.record_batch(elapsed, &results);
            info!(
                rows = results.len(),
                processing_time_us = elapsed.as_micros() as u64,
                "Batch scored"
            );
            Ok(Json(results))
        }
        Err(e) => {
            state.metrics.record_failure();
            Err(e.into())
        }
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
    timestamp: i64,
}

/// Liveness probe
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model: state.pipeline.model_name().to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// Serving metrics snapshot
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
