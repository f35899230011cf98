//! Scoring statistics for the review session

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Instant;

use tracing::info;

use crate::types::prediction::{DecisionSource, PredictionResult};

/// Counters describing what the engine has decided since start-up.
pub struct ReviewMetrics {
    /// Total transactions scored
    pub transactions_scored: AtomicU64,
    /// Transactions classified as fraud
    pub fraud_flagged: AtomicU64,
    /// Decisions per source (model, adaptive-threshold, rule)
    by_source: RwLock<HashMap<DecisionSource, u64>>,
    /// Probability distribution in ten even buckets
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl ReviewMetrics {
    pub fn new() -> Self {
        Self {
            transactions_scored: AtomicU64::new(0),
            fraud_flagged: AtomicU64::new(0),
            by_source: RwLock::new(HashMap::new()),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one scored transaction.
    pub fn record(&self, result: &PredictionResult) {
        self.transactions_scored.fetch_add(1, Ordering::Relaxed);
        if result.is_fraud() {
            self.fraud_flagged.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut by_source) = self.by_source.write() {
            *by_source.entry(result.decision_source).or_insert(0) += 1;
        }

        let bucket = ((result.probability * 10.0).min(9.0)) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Scored transactions per second since start-up.
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn score_distribution(&self) -> [u64; 10] {
        self.score_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or([0; 10])
    }

    pub fn decisions_by_source(&self) -> HashMap<DecisionSource, u64> {
        self.by_source
            .read()
            .map(|by_source| by_source.clone())
            .unwrap_or_default()
    }

    /// Fraction of scored transactions flagged as fraud.
    pub fn fraud_rate(&self) -> f64 {
        let scored = self.transactions_scored.load(Ordering::Relaxed);
        if scored == 0 {
            return 0.0;
        }
        self.fraud_flagged.load(Ordering::Relaxed) as f64 / scored as f64
    }

    /// Log a summary of the session so far.
    pub fn print_summary(&self) {
        let scored = self.transactions_scored.load(Ordering::Relaxed);
        let flagged = self.fraud_flagged.load(Ordering::Relaxed);

        info!(
            scored = scored,
            flagged = flagged,
            fraud_rate = format!("{:.1}%", self.fraud_rate() * 100.0),
            throughput = format!("{:.1} tx/s", self.throughput()),
            "Review session summary"
        );

        for (source, count) in self.decisions_by_source() {
            info!(source = ?source, decisions = count, "Decisions by source");
        }

        let distribution = self.score_distribution();
        let total: u64 = distribution.iter().sum();
        if total > 0 {
            for (i, &count) in distribution.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                info!(
                    bucket = format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                    count = count,
                    share = format!("{:.1}%", count as f64 / total as f64 * 100.0),
                    "Risk score distribution"
                );
            }
        }
    }
}

impl Default for ReviewMetrics {
    fn default() -> Self {
        Self::new()
    }
}
