//! Override-rule evaluation
//!
//! Rules are evaluated in input order against the transaction. Each matching
//! rule contributes its effect: boost-score rules accumulate (sum, not max),
//! force-fraud sets the forced verdict (last match wins), force-review raises
//! the review flag. Every match is recorded with a synthesized reason naming
//! the filters that applied.

use crate::types::prediction::Verdict;
use crate::types::rule::{CountryFilter, RuleAction, RuleDefinition, RuleMatch, TypeFilter};
use crate::types::transaction::TransactionRecord;

/// Combined effect of all matching rules on one transaction.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluation {
    /// Cumulative probability boost from boost-score rules
    pub score_boost: f64,
    /// Verdict forced by a force-fraud rule, if any matched
    pub forced_verdict: Option<Verdict>,
    /// Whether a force-review rule matched
    pub review_required: bool,
    /// Every rule that fired, regardless of action
    pub matches: Vec<RuleMatch>,
}

fn rule_applies(rule: &RuleDefinition, tx: &TransactionRecord, country: Option<&str>) -> bool {
    if !rule.enabled {
        return false;
    }

    if let Some(min_amount) = rule.min_amount {
        if tx.amount < min_amount {
            return false;
        }
    }

    if !rule.transaction_type.allows(tx.tx_type) {
        return false;
    }

    if !rule.country.allows(country) {
        return false;
    }

    if let Some(min_velocity) = rule.min_velocity {
        if tx.drain_ratio() < min_velocity {
            return false;
        }
    }

    true
}

fn describe_match(rule: &RuleDefinition) -> String {
    let mut bits: Vec<String> = Vec::new();

    if let Some(min_amount) = rule.min_amount {
        bits.push(format!("amount >= {min_amount}"));
    }
    if let TypeFilter::Only(tx_type) = rule.transaction_type {
        bits.push(format!("type = {tx_type}"));
    }
    if let CountryFilter::Only(ref code) = rule.country {
        bits.push(format!("country = {code}"));
    }
    if let Some(min_velocity) = rule.min_velocity {
        bits.push(format!("velocity >= {:.0}%", min_velocity * 100.0));
    }

    if bits.is_empty() {
        "Custom condition matched".to_string()
    } else {
        bits.join(", ")
    }
}

/// Evaluate a rule set against a transaction. Disabled rules and rules with
/// any failing filter are skipped; no error conditions exist for well-typed
/// input (out-of-range filters simply never or always match).
pub fn evaluate_rules(
    tx: &TransactionRecord,
    rules: &[RuleDefinition],
    country: Option<&str>,
) -> RuleEvaluation {
    let mut evaluation = RuleEvaluation::default();

    for rule in rules {
        if !rule_applies(rule, tx, country) {
            continue;
        }

        let boost_applied = rule.effective_boost();
        match rule.action {
            RuleAction::BoostScore => evaluation.score_boost += boost_applied,
            RuleAction::ForceFraud => evaluation.forced_verdict = Some(Verdict::Fraud),
            RuleAction::ForceReview => evaluation.review_required = true,
        }

        evaluation.matches.push(RuleMatch {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            action: rule.action,
            boost_applied,
            reason: describe_match(rule),
        });
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::rule::{default_rules, Severity};
    use crate::types::transaction::TransactionType;

    fn boost_rule(id: &str, boost: Option<f64>, severity: Severity) -> RuleDefinition {
        RuleDefinition {
            id: id.to_string(),
            name: format!("Rule {id}"),
            enabled: true,
            severity,
            action: RuleAction::BoostScore,
            boost,
            min_amount: None,
            transaction_type: TypeFilter::Any,
            country: CountryFilter::Any,
            min_velocity: None,
        }
    }

    fn sample_tx() -> TransactionRecord {
        TransactionRecord::new("tx_1", 12000.0, TransactionType::CashOut)
            .with_balances(18000.0, 6000.0, 5000.0, 17000.0)
    }

    #[test]
    fn test_disabled_rule_never_contributes() {
        let mut rule = boost_rule("r1", Some(0.2), Severity::High);
        rule.enabled = false;

        let evaluation = evaluate_rules(&sample_tx(), &[rule], None);
        assert_eq!(evaluation.score_boost, 0.0);
        assert!(evaluation.matches.is_empty());
        assert!(!evaluation.review_required);
        assert!(evaluation.forced_verdict.is_none());
    }

    #[test]
    fn test_boosts_accumulate() {
        let rules = vec![
            boost_rule("r1", Some(0.1), Severity::High),
            boost_rule("r2", None, Severity::Medium), // severity default 0.05
        ];

        let evaluation = evaluate_rules(&sample_tx(), &rules, None);
        assert!((evaluation.score_boost - 0.15).abs() < 1e-9);
        assert_eq!(evaluation.matches.len(), 2);
    }

    #[test]
    fn test_amount_filter() {
        let mut rule = boost_rule("r1", Some(0.1), Severity::High);
        rule.min_amount = Some(20000.0);
        let evaluation = evaluate_rules(&sample_tx(), &[rule.clone()], None);
        assert!(evaluation.matches.is_empty());

        rule.min_amount = Some(10000.0);
        let evaluation = evaluate_rules(&sample_tx(), &[rule], None);
        assert_eq!(evaluation.matches.len(), 1);
    }

    #[test]
    fn test_negative_min_amount_always_matches() {
        let mut rule = boost_rule("r1", Some(0.1), Severity::High);
        rule.min_amount = Some(-500.0);
        let evaluation = evaluate_rules(&sample_tx(), &[rule], None);
        assert_eq!(evaluation.matches.len(), 1);
    }

    #[test]
    fn test_country_filter_needs_supplied_country() {
        let mut rule = boost_rule("r1", Some(0.1), Severity::High);
        rule.country = CountryFilter::Only("IN".to_string());

        assert!(evaluate_rules(&sample_tx(), std::slice::from_ref(&rule), None)
            .matches
            .is_empty());
        assert!(
            evaluate_rules(&sample_tx(), std::slice::from_ref(&rule), Some("US"))
                .matches
                .is_empty()
        );
        assert_eq!(
            evaluate_rules(&sample_tx(), &[rule], Some("IN")).matches.len(),
            1
        );
    }

    #[test]
    fn test_velocity_filter() {
        let mut rule = boost_rule("r1", Some(0.1), Severity::High);
        rule.min_velocity = Some(0.9);

        // sample_tx drains 12000/18000 = 0.67, below the filter
        assert!(evaluate_rules(&sample_tx(), std::slice::from_ref(&rule), None)
            .matches
            .is_empty());

        let drained = TransactionRecord::new("tx_2", 9500.0, TransactionType::CashOut)
            .with_balances(10000.0, 500.0, 0.0, 9500.0);
        assert_eq!(evaluate_rules(&drained, &[rule], None).matches.len(), 1);
    }

    #[test]
    fn test_force_actions() {
        let mut review = boost_rule("review", None, Severity::High);
        review.action = RuleAction::ForceReview;
        let mut fraud = boost_rule("fraud", None, Severity::Critical);
        fraud.action = RuleAction::ForceFraud;

        let evaluation = evaluate_rules(&sample_tx(), &[review, fraud], None);
        assert!(evaluation.review_required);
        assert_eq!(evaluation.forced_verdict, Some(Verdict::Fraud));
        assert_eq!(evaluation.score_boost, 0.0);
        // Non-boost matches record zero boost but still appear
        assert_eq!(evaluation.matches.len(), 2);
        assert_eq!(evaluation.matches[0].boost_applied, 0.0);
    }

    #[test]
    fn test_match_reason_text() {
        let rules = default_rules();
        let tx = sample_tx();
        let evaluation = evaluate_rules(&tx, &rules, None);

        // Only "Large Cash-Out Burst" applies: amount and type filters named
        assert_eq!(evaluation.matches.len(), 1);
        assert_eq!(evaluation.matches[0].rule_id, "rule-cashout-large");
        assert_eq!(evaluation.matches[0].reason, "amount >= 10000, type = CASH_OUT");

        let bare = boost_rule("bare", Some(0.05), Severity::Low);
        let evaluation = evaluate_rules(&tx, &[bare], None);
        assert_eq!(evaluation.matches[0].reason, "Custom condition matched");
    }
}
