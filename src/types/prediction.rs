//! Prediction output data structures

use serde::{Deserialize, Serialize};

use crate::types::rule::RuleMatch;
use crate::types::transaction::TransactionRecord;

/// Final classification for a scored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Fraud,
    #[serde(rename = "Not Fraud")]
    NotFraud,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Fraud => f.write_str("Fraud"),
            Verdict::NotFraud => f.write_str("Not Fraud"),
        }
    }
}

/// Which mechanism produced the final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionSource {
    /// Plain model score against the baseline threshold
    Model,
    /// Model score against a context-adjusted threshold
    AdaptiveThreshold,
    /// A rule override decided the outcome
    Rule,
}

/// One ranked explanation entry attached to a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonCode {
    pub code: String,
    pub title: String,
    pub score: f64,
    pub detail: String,
}

/// Sub-score breakdown surfaced alongside the probability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub velocity: f64,
    pub anomaly: f64,
    pub behavioral: f64,
}

/// The full output of one scoring call. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub verdict: Verdict,

    /// Fraud probability in [0, 1]
    pub probability: f64,

    /// Human-readable reasoning sentence
    pub reasoning: String,

    /// The decision boundary actually applied
    pub threshold_used: f64,

    pub decision_source: DecisionSource,

    /// Ranked explanations, at most five
    pub reason_codes: Vec<ReasonCode>,

    /// Rules that fired against this transaction
    pub matched_rules: Vec<RuleMatch>,

    pub risk_metrics: RiskMetrics,
}

impl PredictionResult {
    pub fn is_fraud(&self) -> bool {
        self.verdict == Verdict::Fraud
    }
}

/// A scored transaction retained in the bounded review history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub transaction: TransactionRecord,
    pub result: PredictionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_json::to_string(&Verdict::Fraud).unwrap(), "\"Fraud\"");
        assert_eq!(
            serde_json::to_string(&Verdict::NotFraud).unwrap(),
            "\"Not Fraud\""
        );
        let parsed: Verdict = serde_json::from_str("\"Not Fraud\"").unwrap();
        assert_eq!(parsed, Verdict::NotFraud);
    }

    #[test]
    fn test_decision_source_serialization() {
        assert_eq!(
            serde_json::to_string(&DecisionSource::AdaptiveThreshold).unwrap(),
            "\"adaptive-threshold\""
        );
        assert_eq!(
            serde_json::to_string(&DecisionSource::Model).unwrap(),
            "\"model\""
        );
    }
}
