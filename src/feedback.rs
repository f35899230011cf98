//! Analyst feedback labels and model-monitoring aggregates

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{load_or, persist, KeyValueStore, FEEDBACK_KEY};
use crate::types::prediction::{HistoryItem, Verdict};
use crate::types::transaction::TransactionType;

/// Label an analyst attaches to a scored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLabel {
    ConfirmedFraud,
    FalsePositive,
    NeedsReview,
}

impl FeedbackLabel {
    pub fn display_text(&self) -> &'static str {
        match self {
            FeedbackLabel::ConfirmedFraud => "Confirmed Fraud",
            FeedbackLabel::FalsePositive => "False Positive",
            FeedbackLabel::NeedsReview => "Needs Review",
        }
    }
}

/// One analyst judgement about a prediction. At most one per transaction;
/// resubmitting replaces the previous label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystFeedback {
    pub id: String,
    pub transaction_id: String,
    pub label: FeedbackLabel,
    pub verdict: Verdict,
    pub probability: f64,
    pub timestamp: String,
    pub analyst: String,
}

/// Repository for analyst feedback, one slot holding the full list.
pub struct FeedbackStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> FeedbackStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Vec<AnalystFeedback> {
        load_or(&*self.store, FEEDBACK_KEY, Vec::new)
    }

    pub fn find_by_transaction(&self, transaction_id: &str) -> Option<AnalystFeedback> {
        self.load()
            .into_iter()
            .find(|item| item.transaction_id == transaction_id)
    }

    /// Insert or replace the feedback for a transaction, keeping its original
    /// identifier when replacing.
    pub fn upsert(
        &self,
        transaction_id: &str,
        label: FeedbackLabel,
        verdict: Verdict,
        probability: f64,
        analyst: &str,
    ) -> AnalystFeedback {
        let mut items = self.load();
        let existing_id = items
            .iter()
            .find(|item| item.transaction_id == transaction_id)
            .map(|item| item.id.clone());

        let suffix: String = Uuid::new_v4().simple().to_string()[..4].to_uppercase();
        let next = AnalystFeedback {
            id: existing_id.unwrap_or_else(|| {
                format!("FDB-{}-{}", Utc::now().timestamp_millis(), suffix)
            }),
            transaction_id: transaction_id.to_string(),
            label,
            verdict,
            probability,
            timestamp: Utc::now().to_rfc3339(),
            analyst: analyst.to_string(),
        };

        if let Some(slot) = items
            .iter_mut()
            .find(|item| item.transaction_id == transaction_id)
        {
            *slot = next.clone();
        } else {
            items.insert(0, next.clone());
        }

        persist(&*self.store, FEEDBACK_KEY, &items);
        next
    }
}

/// Per-type slice of the monitoring snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TypeBreakdown {
    pub tx_type: TransactionType,
    pub total: usize,
    pub labeled: usize,
    pub confirmed_fraud: usize,
    pub false_positive: usize,
}

/// Aggregate health view of the scoring heuristics against analyst labels.
/// Percentages are rounded to one decimal place.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSnapshot {
    pub total_predictions: usize,
    pub labeled_count: usize,
    pub label_coverage: f64,
    pub confirmed_fraud: usize,
    pub false_positive: usize,
    pub needs_review: usize,
    pub precision_estimate: f64,
    pub false_positive_rate: f64,
    pub average_risk: f64,
    pub drift_score: f64,
    pub by_type: Vec<TypeBreakdown>,
}

fn to_percent(value: f64) -> f64 {
    (value * 1000.0).round() / 10.0
}

impl MonitoringSnapshot {
    /// Build the snapshot from the bounded review history (most recent first)
    /// and the current feedback list.
    pub fn build(history: &[HistoryItem], feedback: &[AnalystFeedback]) -> Self {
        let total_predictions = history.len();
        let labeled_count = feedback.len();
        let label_coverage = if total_predictions > 0 {
            labeled_count as f64 / total_predictions as f64
        } else {
            0.0
        };

        let count_label = |label: FeedbackLabel| {
            feedback.iter().filter(|f| f.label == label).count()
        };
        let confirmed_fraud = count_label(FeedbackLabel::ConfirmedFraud);
        let false_positive = count_label(FeedbackLabel::FalsePositive);
        let needs_review = count_label(FeedbackLabel::NeedsReview);

        let predicted_fraud = history.iter().filter(|h| h.result.is_fraud()).count();
        let precision_estimate = if predicted_fraud > 0 {
            confirmed_fraud as f64 / predicted_fraud as f64
        } else {
            0.0
        };
        let false_positive_rate = if predicted_fraud > 0 {
            false_positive as f64 / predicted_fraud as f64
        } else {
            0.0
        };

        let mean_probability = |items: &[HistoryItem]| -> Option<f64> {
            if items.is_empty() {
                return None;
            }
            Some(items.iter().map(|h| h.result.probability).sum::<f64>() / items.len() as f64)
        };

        let average_risk = mean_probability(history).unwrap_or(0.0);

        // Drift compares the most recent window against the window behind it
        let recent_end = history.len().min(15);
        let baseline_end = history.len().min(45);
        let recent_avg = mean_probability(&history[..recent_end]).unwrap_or(average_risk);
        let baseline_avg =
            mean_probability(&history[recent_end..baseline_end]).unwrap_or(average_risk);
        let drift_score = (recent_avg - baseline_avg).abs();

        let by_type = TransactionType::ALL
            .iter()
            .map(|&tx_type| {
                let for_type: Vec<&HistoryItem> = history
                    .iter()
                    .filter(|item| item.transaction.tx_type == tx_type)
                    .collect();
                let tx_ids: HashSet<&str> = for_type
                    .iter()
                    .map(|item| item.transaction.id.as_str())
                    .collect();
                let labels: Vec<&AnalystFeedback> = feedback
                    .iter()
                    .filter(|item| tx_ids.contains(item.transaction_id.as_str()))
                    .collect();

                TypeBreakdown {
                    tx_type,
                    total: for_type.len(),
                    labeled: labels.len(),
                    confirmed_fraud: labels
                        .iter()
                        .filter(|l| l.label == FeedbackLabel::ConfirmedFraud)
                        .count(),
                    false_positive: labels
                        .iter()
                        .filter(|l| l.label == FeedbackLabel::FalsePositive)
                        .count(),
                }
            })
            .collect();

        Self {
            total_predictions,
            labeled_count,
            label_coverage: to_percent(label_coverage),
            confirmed_fraud,
            false_positive,
            needs_review,
            precision_estimate: to_percent(precision_estimate),
            false_positive_rate: to_percent(false_positive_rate),
            average_risk: to_percent(average_risk),
            drift_score: to_percent(drift_score),
            by_type,
        }
    }
}
