//! Serving metrics for the scoring endpoint.
//!
//! Counters live in the HTTP layer; the scoring pipeline itself keeps no
//! state between batches.

use crate::types::prediction::{PredictionResult, RiskTier};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Batch latencies kept for percentile computation
const LATENCY_WINDOW: usize = 10_000;

/// Metrics collector for the scoring service
pub struct ServiceMetrics {
    /// Batches scored successfully
    pub batches_scored: AtomicU64,
    /// Batches rejected or failed
    pub batches_failed: AtomicU64,
    /// Transactions scored
    pub transactions_scored: AtomicU64,
    /// Results per tier, indexed like `RiskTier::ALL`
    tier_counts: [AtomicU64; 3],
    /// Fraud probability histogram, ten equal buckets over [0, 1]
    score_buckets: RwLock<[u64; 10]>,
    /// Batch latencies in microseconds
    batch_times: RwLock<Vec<u64>>,
    /// Start time for throughput calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            batches_scored: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            transactions_scored: AtomicU64::new(0),
            tier_counts: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            score_buckets: RwLock::new([0; 10]),
            batch_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully scored batch
    pub fn record_batch(&self, elapsed: Duration, results: &[PredictionResult]) {
        self.batches_scored.fetch_add(1, Ordering::Relaxed);
        self.transactions_scored
            .fetch_add(results.len() as u64, Ordering::Relaxed);

        for result in results {
            self.tier_counts[tier_index(result.status)].fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut buckets) = self.score_buckets.write() {
            for result in results {
                let bucket = (result.fraud_probability / 10.0).min(9.0) as usize;
                buckets[bucket] += 1;
            }
        }

        if let Ok(mut times) = self.batch_times.write() {
            times.push(elapsed.as_micros() as u64);
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    /// Record a batch that did not produce results
    pub fn record_failure(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count of results in a tier
    pub fn tier_count(&self, tier: RiskTier) -> u64 {
        self.tier_counts[tier_index(tier)].load(Ordering::Relaxed)
    }

    /// Get batch latency statistics
    pub fn latency_stats(&self) -> LatencyStats {
        let Ok(times) = self.batch_times.read() else {
            return LatencyStats::default();
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();
        let count = sorted.len();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Transactions per second since startup
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Point-in-time view of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            batches_scored: self.batches_scored.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            transactions_scored: self.transactions_scored.load(Ordering::Relaxed),
            throughput_tps: self.throughput(),
            tiers: TierCounts {
                legitimate: self.tier_count(RiskTier::Legitimate),
                manual_review: self.tier_count(RiskTier::ManualReview),
                fraud: self.tier_count(RiskTier::Fraud),
            },
            score_distribution: self.score_buckets.read().map(|b| *b).unwrap_or_default(),
            latency: self.latency_stats(),
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let total = snapshot.transactions_scored;
        let pct = |count: u64| {
            if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };

        info!(
            batches = snapshot.batches_scored,
            failed = snapshot.batches_failed,
            transactions = total,
            throughput = format!("{:.1} tx/s", snapshot.throughput_tps),
            "Scoring summary"
        );
        info!(
            legitimate = format!("{} ({:.1}%)", snapshot.tiers.legitimate, pct(snapshot.tiers.legitimate)),
            manual_review = format!("{} ({:.1}%)", snapshot.tiers.manual_review, pct(snapshot.tiers.manual_review)),
            fraud = format!("{} ({:.1}%)", snapshot.tiers.fraud, pct(snapshot.tiers.fraud)),
            "Risk tiers"
        );
        info!(
            mean_us = snapshot.latency.mean_us,
            p50_us = snapshot.latency.p50_us,
            p95_us = snapshot.latency.p95_us,
            p99_us = snapshot.latency.p99_us,
            max_us = snapshot.latency.max_us,
            "Batch latency"
        );
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn tier_index(tier: RiskTier) -> usize {
    match tier {
        RiskTier::Legitimate => 0,
        RiskTier::ManualReview => 1,
        RiskTier::Fraud => 2,
    }
}

/// Batch latency statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Results per risk tier
#[derive(Debug, Clone, Serialize)]
pub struct TierCounts {
    pub legitimate: u64,
    pub manual_review: u64,
    pub fraud: u64,
}

/// Serializable metrics view served at `/metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub batches_scored: u64,
    pub batches_failed: u64,
    pub transactions_scored: u64,
    pub throughput_tps: f64,
    pub tiers: TierCounts,
    pub score_distribution: [u64; 10],
    pub latency: LatencyStats,
}

/// Periodic metrics summary logger
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(probability: f64, status: RiskTier) -> PredictionResult {
        PredictionResult::new(u8::from(probability > 0.5), probability, status, Vec::new())
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_batch(
            Duration::from_micros(100),
            &[
                result(0.1, RiskTier::Legitimate),
                result(0.95, RiskTier::Fraud),
            ],
        );
        metrics.record_batch(Duration::from_micros(300), &[result(0.6, RiskTier::ManualReview)]);
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_scored, 2);
        assert_eq!(snapshot.batches_failed, 1);
        assert_eq!(snapshot.transactions_scored, 3);
        assert_eq!(snapshot.tiers.legitimate, 1);
        assert_eq!(snapshot.tiers.manual_review, 1);
        assert_eq!(snapshot.tiers.fraud, 1);
        assert_eq!(snapshot.score_distribution[1], 1);
        assert_eq!(snapshot.score_distribution[6], 1);
        assert_eq!(snapshot.score_distribution[9], 1);
        assert_eq!(snapshot.latency.count, 2);
        assert_eq!(snapshot.latency.max_us, 300);
    }

    #[test]
    fn test_certain_fraud_lands_in_last_bucket() {
        let metrics = ServiceMetrics::new();
        metrics.record_batch(Duration::from_micros(5), &[result(1.0, RiskTier::Fraud)]);
        assert_eq!(metrics.snapshot().score_distribution[9], 1);
    }

    #[test]
    fn test_empty_latency_stats() {
        let stats = ServiceMetrics::new().latency_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.p99_us, 0);
    }
}
