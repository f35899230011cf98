//! Heuristic risk scoring
//!
//! Converts a transaction into a fraud probability from four sub-scores
//! (amount stress, behavioral baseline, balance anomaly, movement velocity),
//! layered heuristic bonuses, and the rule engine's boost, then derives the
//! verdict with rule-override precedence: forced verdict > review escalation
//! > threshold comparison.

use crate::engine::rules::{evaluate_rules, RuleEvaluation};
use crate::types::prediction::{
    DecisionSource, PredictionResult, ReasonCode, RiskMetrics, Verdict,
};
use crate::types::rule::{RuleAction, RuleDefinition};
use crate::types::transaction::{TransactionRecord, TransactionType};

/// The hardcoded model baseline; any other operative threshold marks the
/// decision as adaptive.
pub const BASELINE_THRESHOLD: f64 = 0.65;

/// Amount above which the amount sub-score saturates.
const AMOUNT_SATURATION: f64 = 20000.0;

/// Maximum number of reason codes attached to a prediction.
const MAX_REASON_CODES: usize = 5;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Historical fraud-rate baseline per transaction type.
fn behavior_score(tx_type: TransactionType) -> f64 {
    match tx_type {
        TransactionType::CashOut => 0.88,
        TransactionType::Transfer => 0.8,
        TransactionType::Payment => 0.55,
        TransactionType::Debit => 0.5,
        TransactionType::CashIn => 0.28,
    }
}

#[derive(Debug, Clone, Copy)]
struct SubScores {
    amount: f64,
    behavior: f64,
    origin_mismatch: f64,
    dest_mismatch: f64,
    anomaly: f64,
    drain_ratio: f64,
    velocity: f64,
}

fn compute_sub_scores(tx: &TransactionRecord) -> SubScores {
    let amount = clamp01(tx.amount / AMOUNT_SATURATION);
    let behavior = behavior_score(tx.tx_type);

    let origin_delta = tx.origin_balance_before - tx.origin_balance_after;
    let expected_origin_delta = if tx.tx_type == TransactionType::CashIn {
        -tx.amount
    } else {
        tx.amount
    };
    let origin_mismatch =
        clamp01((origin_delta - expected_origin_delta).abs() / tx.amount.max(1.0));

    let dest_delta = tx.dest_balance_after - tx.dest_balance_before;
    // The expected destination delta is the amount for every type, cash-in
    // included. Inherited behavior; the asymmetry with the origin formula is
    // deliberate and load-bearing for score compatibility.
    let expected_dest_delta = tx.amount;
    let dest_mismatch = clamp01((dest_delta - expected_dest_delta).abs() / tx.amount.max(1.0));

    let anomaly = clamp01((origin_mismatch + dest_mismatch + amount) / 3.0);

    let drain_ratio = tx.drain_ratio();
    let dest_growth = if tx.dest_balance_before > 0.0 {
        clamp01(dest_delta / tx.dest_balance_before.max(1.0))
    } else {
        clamp01(dest_delta / tx.amount.max(1.0))
    };
    let velocity = clamp01((drain_ratio + dest_growth + amount) / 3.0);

    SubScores {
        amount,
        behavior,
        origin_mismatch,
        dest_mismatch,
        anomaly,
        drain_ratio,
        velocity,
    }
}

fn build_reasoning(scores: &SubScores) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if scores.amount > 0.7 {
        parts.push("high-value amount");
    }
    if scores.origin_mismatch > 0.55 || scores.dest_mismatch > 0.55 {
        parts.push("balance movement mismatch");
    }
    if scores.behavior > 0.75 {
        parts.push("transaction type with elevated historical risk");
    }
    if scores.drain_ratio > 0.85 {
        parts.push("rapid depletion of origin account");
    }

    if parts.is_empty() {
        "No major anomaly pattern detected in amount, balance movement, or transaction type."
            .to_string()
    } else {
        format!("Risk elevated due to {}.", parts.join(", "))
    }
}

fn build_reason_codes(
    tx: &TransactionRecord,
    scores: &SubScores,
    evaluation: &RuleEvaluation,
) -> Vec<ReasonCode> {
    let mut codes = vec![
        ReasonCode {
            code: "velocity".to_string(),
            title: "Velocity Shift".to_string(),
            score: scores.velocity,
            detail: "Rapid fund movement relative to account baselines.".to_string(),
        },
        ReasonCode {
            code: "anomaly".to_string(),
            title: "Balance Anomaly".to_string(),
            score: scores.anomaly,
            detail: "Observed balance changes diverge from expected transaction mechanics."
                .to_string(),
        },
        ReasonCode {
            code: "behavior".to_string(),
            title: "Behavioral Pattern".to_string(),
            score: scores.behavior,
            detail: format!("Historical risk profile for {} transactions.", tx.tx_type),
        },
        ReasonCode {
            code: "amount".to_string(),
            title: "Amount Stress".to_string(),
            score: scores.amount,
            detail: "Transaction size compared to fraud-prone value ranges.".to_string(),
        },
    ];

    for m in &evaluation.matches {
        let score = if m.action == RuleAction::BoostScore {
            (0.6 + m.boost_applied).min(1.0)
        } else {
            0.95
        };
        codes.push(ReasonCode {
            code: format!("rule_{}", m.rule_id),
            title: format!("Rule Matched: {}", m.rule_name),
            score,
            detail: m.reason.clone(),
        });
    }

    codes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    codes.truncate(MAX_REASON_CODES);
    codes
}

/// Score a transaction against an operative threshold and rule set.
///
/// Infallible by contract: inputs are validated upstream and every
/// intermediate value is clamped, so the probability is always in [0, 1].
pub fn score_transaction(
    tx: &TransactionRecord,
    threshold: f64,
    rules: &[RuleDefinition],
    country: Option<&str>,
) -> PredictionResult {
    let scores = compute_sub_scores(tx);

    let mut probability =
        scores.velocity * 0.35 + scores.anomaly * 0.4 + scores.behavior * 0.25;

    if tx.amount >= 10000.0
        && matches!(
            tx.tx_type,
            TransactionType::CashOut | TransactionType::Transfer
        )
    {
        probability += 0.08;
    }
    if scores.drain_ratio >= 0.9 && tx.tx_type != TransactionType::CashIn {
        probability += 0.06;
    }
    if scores.origin_mismatch > 0.7 || scores.dest_mismatch > 0.7 {
        probability += 0.06;
    }

    let country = country.or(tx.country.as_deref());
    let evaluation = evaluate_rules(tx, rules, country);
    probability = clamp01(probability + evaluation.score_boost);

    let mut verdict = if probability >= threshold {
        Verdict::Fraud
    } else {
        Verdict::NotFraud
    };
    let mut decision_source = if (threshold - BASELINE_THRESHOLD).abs() > f64::EPSILON {
        DecisionSource::AdaptiveThreshold
    } else {
        DecisionSource::Model
    };

    // A review rule escalates to Fraud only when the score is already close
    // to the boundary; a forced verdict wins unconditionally.
    if evaluation.review_required && probability >= (threshold - 0.08).max(0.45) {
        verdict = Verdict::Fraud;
        decision_source = DecisionSource::Rule;
    }
    if let Some(forced) = evaluation.forced_verdict {
        verdict = forced;
        decision_source = DecisionSource::Rule;
    }

    let reasoning = build_reasoning(&scores);
    let reason_codes = build_reason_codes(tx, &scores, &evaluation);

    PredictionResult {
        verdict,
        probability,
        reasoning,
        threshold_used: threshold,
        decision_source,
        reason_codes,
        matched_rules: evaluation.matches,
        risk_metrics: RiskMetrics {
            velocity: scores.velocity,
            anomaly: scores.anomaly,
            behavioral: scores.behavior,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::rule::{default_rules, CountryFilter, RuleDefinition, Severity, TypeFilter};

    fn payment_tx() -> TransactionRecord {
        TransactionRecord::new("tx_safe", 400.0, TransactionType::Payment)
            .with_balances(2200.0, 1800.0, 100.0, 500.0)
    }

    fn cashout_tx() -> TransactionRecord {
        TransactionRecord::new("tx_burst", 12000.0, TransactionType::CashOut)
            .with_balances(18000.0, 6000.0, 5000.0, 17000.0)
    }

    #[test]
    fn test_safe_payment_scores_below_baseline() {
        let result = score_transaction(&payment_tx(), BASELINE_THRESHOLD, &[], None);

        assert_eq!(result.verdict, Verdict::NotFraud);
        assert_eq!(result.decision_source, DecisionSource::Model);
        assert!(result.probability < 0.5, "got {}", result.probability);
        assert!(result.matched_rules.is_empty());
        assert_eq!(
            result.reasoning,
            "No major anomaly pattern detected in amount, balance movement, or transaction type."
        );
    }

    #[test]
    fn test_large_cashout_with_rule_flags_fraud() {
        let rules = default_rules();
        let result = score_transaction(&cashout_tx(), BASELINE_THRESHOLD, &rules, None);

        assert_eq!(result.verdict, Verdict::Fraud);
        assert_eq!(result.matched_rules.len(), 1);
        assert_eq!(result.matched_rules[0].rule_id, "rule-cashout-large");
        // Base 0.5644 + large-amount bonus 0.08 + rule boost 0.12
        assert!((result.probability - 0.7644).abs() < 1e-3, "got {}", result.probability);
    }

    #[test]
    fn test_probability_always_bounded() {
        let extreme = TransactionRecord::new("tx_max", 1_000_000.0, TransactionType::CashOut)
            .with_balances(1_000_000.0, 0.0, 0.0, 0.0);
        let rules: Vec<RuleDefinition> = (0..10)
            .map(|i| RuleDefinition {
                id: format!("boost-{i}"),
                name: format!("Boost {i}"),
                enabled: true,
                severity: Severity::Critical,
                action: RuleAction::BoostScore,
                boost: Some(0.5),
                min_amount: None,
                transaction_type: TypeFilter::Any,
                country: CountryFilter::Any,
                min_velocity: None,
            })
            .collect();

        let result = score_transaction(&extreme, BASELINE_THRESHOLD, &rules, None);
        assert!(result.probability <= 1.0);
        assert!(result.probability >= 0.0);

        let zero = TransactionRecord::new("tx_zero", 0.0, TransactionType::CashIn);
        let result = score_transaction(&zero, BASELINE_THRESHOLD, &[], None);
        assert!((0.0..=1.0).contains(&result.probability));
    }

    #[test]
    fn test_adaptive_threshold_marks_source() {
        let result = score_transaction(&payment_tx(), 0.6, &[], None);
        assert_eq!(result.decision_source, DecisionSource::AdaptiveThreshold);
    }

    #[test]
    fn test_forced_fraud_beats_review_escalation() {
        let force_fraud = RuleDefinition {
            id: "force-fraud".to_string(),
            name: "Force Fraud".to_string(),
            enabled: true,
            severity: Severity::Critical,
            action: RuleAction::ForceFraud,
            boost: None,
            min_amount: None,
            transaction_type: TypeFilter::Any,
            country: CountryFilter::Any,
            min_velocity: None,
        };
        let force_review = RuleDefinition {
            id: "force-review".to_string(),
            name: "Force Review".to_string(),
            action: RuleAction::ForceReview,
            ..force_fraud.clone()
        };

        // Even a low-probability transaction is forced to Fraud
        let result = score_transaction(
            &payment_tx(),
            BASELINE_THRESHOLD,
            &[force_review, force_fraud],
            None,
        );
        assert_eq!(result.verdict, Verdict::Fraud);
        assert_eq!(result.decision_source, DecisionSource::Rule);
    }

    #[test]
    fn test_review_escalation_needs_probability_floor() {
        let force_review = RuleDefinition {
            id: "force-review".to_string(),
            name: "Force Review".to_string(),
            enabled: true,
            severity: Severity::High,
            action: RuleAction::ForceReview,
            boost: None,
            min_amount: None,
            transaction_type: TypeFilter::Any,
            country: CountryFilter::Any,
            min_velocity: None,
        };

        // Safe payment sits well below max(0.45, threshold - 0.08): no escalation
        let result = score_transaction(
            &payment_tx(),
            BASELINE_THRESHOLD,
            std::slice::from_ref(&force_review),
            None,
        );
        assert_eq!(result.verdict, Verdict::NotFraud);

        // The cash-out burst scores 0.6444 without boost rules, inside the
        // escalation window below the 0.65 boundary
        let result = score_transaction(
            &cashout_tx(),
            BASELINE_THRESHOLD,
            &[force_review],
            None,
        );
        assert_eq!(result.verdict, Verdict::Fraud);
        assert_eq!(result.decision_source, DecisionSource::Rule);
    }

    #[test]
    fn test_reason_codes_ranked_and_capped() {
        let rules = default_rules();
        let result = score_transaction(&cashout_tx(), BASELINE_THRESHOLD, &rules, None);

        assert!(result.reason_codes.len() <= 5);
        for pair in result.reason_codes.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // The matched boost rule ranks at 0.6 + 0.12
        assert!(result
            .reason_codes
            .iter()
            .any(|c| c.code == "rule_rule-cashout-large" && (c.score - 0.72).abs() < 1e-9));
    }

    #[test]
    fn test_mismatch_bonus_applies() {
        // Balances that do not move at all for a transfer: both mismatches 1.0
        let tx = TransactionRecord::new("tx_ghost", 5000.0, TransactionType::Transfer)
            .with_balances(10000.0, 10000.0, 2000.0, 2000.0);
        let result = score_transaction(&tx, BASELINE_THRESHOLD, &[], None);
        assert!(result.reasoning.contains("balance movement mismatch"));
    }

    #[test]
    fn test_country_falls_back_to_transaction() {
        let corridor_rule = RuleDefinition {
            id: "corridor".to_string(),
            name: "Corridor".to_string(),
            enabled: true,
            severity: Severity::High,
            action: RuleAction::BoostScore,
            boost: Some(0.1),
            min_amount: None,
            transaction_type: TypeFilter::Any,
            country: CountryFilter::Only("IN".to_string()),
            min_velocity: None,
        };

        let tx = payment_tx().with_country("IN");
        let result = score_transaction(&tx, BASELINE_THRESHOLD, &[corridor_rule], None);
        assert_eq!(result.matched_rules.len(), 1);
    }
}
