//! Review-session orchestration
//!
//! Wires the pure engine components to the injected storage, the audit
//! ledger, and the session metrics: resolve the adaptive threshold, blend it
//! with the manual review threshold, score, retain bounded history, and
//! record every consequential action in the ledger.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use tracing::info;

use crate::config::DetectionConfig;
use crate::dispatch::{dispatch_high_risk_alert, DispatchOutcome, IntegrationStore, IntegrationTarget};
use crate::engine::scoring::score_transaction;
use crate::engine::threshold::{blend_with_manual, resolve_threshold, ResolvedThreshold, ThresholdConfig};
use crate::feedback::{AnalystFeedback, FeedbackLabel, FeedbackStore, MonitoringSnapshot};
use crate::ledger::{AuditLedger, ChainVerification};
use crate::metrics::ReviewMetrics;
use crate::storage::{KeyValueStore, RuleStore, ThresholdStore};
use crate::types::audit::{AuditCategory, AuditEvent, AuditLogEntry, AuditStatus};
use crate::types::prediction::{HistoryItem, PredictionResult};
use crate::types::rule::RuleDefinition;
use crate::types::transaction::TransactionRecord;

/// Probability at/above which a fraud verdict triggers the auto-lock entry.
const AUTO_LOCK_FLOOR: f64 = 0.95;

/// A full review session over one shared store.
pub struct ReviewService<S: KeyValueStore> {
    rules: RuleStore<S>,
    thresholds: ThresholdStore<S>,
    feedback: FeedbackStore<S>,
    integrations: IntegrationStore<S>,
    ledger: AuditLedger<S>,
    metrics: Arc<ReviewMetrics>,
    manual_threshold: f64,
    realtime_alerts: bool,
    auto_lock: bool,
    history_limit: usize,
    history: Mutex<VecDeque<HistoryItem>>,
}

impl<S: KeyValueStore> ReviewService<S> {
    pub fn new(store: Arc<S>, detection: &DetectionConfig) -> Self {
        let ledger = AuditLedger::new(store.clone());
        ledger.ensure_initialized();

        Self {
            rules: RuleStore::new(store.clone()),
            thresholds: ThresholdStore::new(store.clone()),
            feedback: FeedbackStore::new(store.clone()),
            integrations: IntegrationStore::new(store),
            ledger,
            metrics: Arc::new(ReviewMetrics::new()),
            manual_threshold: detection.manual_threshold,
            realtime_alerts: detection.realtime_alerts,
            auto_lock: detection.auto_lock,
            history_limit: detection.history_limit,
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn metrics(&self) -> Arc<ReviewMetrics> {
        self.metrics.clone()
    }

    pub fn rules(&self) -> Vec<RuleDefinition> {
        self.rules.load()
    }

    pub fn threshold_config(&self) -> ThresholdConfig {
        self.thresholds.load()
    }

    /// Resolve the adaptive threshold for a transaction without scoring it.
    pub fn resolve_threshold(
        &self,
        tx: &TransactionRecord,
        country: Option<&str>,
        now: NaiveDateTime,
    ) -> ResolvedThreshold {
        let config = self.thresholds.load();
        resolve_threshold(tx, &config, country.or(tx.country.as_deref()), now)
    }

    /// Score a transaction: adaptive threshold blended with the manual
    /// threshold, rules applied, verdict recorded in history, metrics, and
    /// the audit ledger.
    pub fn score(&self, tx: &TransactionRecord, now: NaiveDateTime) -> PredictionResult {
        let adaptive = self.resolve_threshold(tx, None, now);
        let threshold = blend_with_manual(adaptive.threshold, self.manual_threshold);
        let rules = self.rules.load();

        let result = score_transaction(tx, threshold, &rules, None);
        self.metrics.record(&result);

        info!(
            transaction_id = %tx.id,
            verdict = %result.verdict,
            probability = result.probability,
            threshold = threshold,
            source = ?result.decision_source,
            "Transaction scored"
        );

        if let Ok(mut history) = self.history.lock() {
            history.push_front(HistoryItem {
                transaction: tx.clone(),
                result: result.clone(),
            });
            history.truncate(self.history_limit);
        }

        // Fraud verdicts are recorded as warnings so the trail flags them
        let score_status = if result.is_fraud() {
            AuditStatus::Warning
        } else {
            AuditStatus::Success
        };
        self.ledger.append(
            AuditEvent::new(
                "Transaction Scored",
                AuditCategory::Model,
                format!(
                    "{} -> {} ({}%), threshold {}%",
                    tx.id,
                    result.verdict,
                    (result.probability * 100.0).round(),
                    (threshold * 100.0).round()
                ),
            )
            .with_status(score_status),
        );

        if self.auto_lock && result.is_fraud() && result.probability >= AUTO_LOCK_FLOOR {
            self.ledger.append(
                AuditEvent::new(
                    "Auto-Lock Triggered",
                    AuditCategory::Risk,
                    format!(
                        "Entity lock requested for transaction {} after {}% risk score.",
                        tx.id,
                        (result.probability * 100.0).round()
                    ),
                )
                .with_status(AuditStatus::Warning),
            );
        }

        result
    }

    /// Fan out a fraud verdict to the enabled integrations, recording every
    /// outcome in the ledger. No-op unless realtime alerts are on and the
    /// verdict is Fraud.
    pub async fn dispatch_alerts(
        &self,
        tx: &TransactionRecord,
        result: &PredictionResult,
    ) -> Vec<DispatchOutcome> {
        if !self.realtime_alerts || !result.is_fraud() {
            return Vec::new();
        }

        let targets = self.integrations.load();
        let outcomes = dispatch_high_risk_alert(tx, result, &targets).await;
        for outcome in &outcomes {
            let status = if outcome.ok {
                AuditStatus::Success
            } else {
                AuditStatus::Failed
            };
            self.ledger.append(
                AuditEvent::new(
                    "Integration Dispatch",
                    AuditCategory::Integration,
                    format!("{}: {}", outcome.target_name, outcome.message),
                )
                .with_status(status),
            );
        }
        outcomes
    }

    /// Scored transactions, most recent first, bounded by the history limit.
    pub fn history(&self) -> Vec<HistoryItem> {
        self.history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Record an analyst label for a scored transaction.
    pub fn submit_feedback(
        &self,
        transaction_id: &str,
        label: FeedbackLabel,
        result: &PredictionResult,
        analyst: &str,
    ) -> AnalystFeedback {
        let item = self.feedback.upsert(
            transaction_id,
            label,
            result.verdict,
            result.probability,
            analyst,
        );

        self.ledger.append(
            AuditEvent::new(
                "Analyst Feedback Submitted",
                AuditCategory::Model,
                format!("{analyst} labeled {transaction_id} as {}", label.display_text()),
            )
            .with_actor(analyst),
        );

        item
    }

    /// Replace the rule set and record the change.
    pub fn update_rules(&self, rules: &[RuleDefinition], actor: &str) {
        self.rules.save(rules);
        let active = rules.iter().filter(|rule| rule.enabled).count();
        self.ledger.append(
            AuditEvent::new(
                "Rules Updated",
                AuditCategory::Rules,
                format!("Rule set updated. Active rules: {active}"),
            )
            .with_actor(actor),
        );
    }

    /// Replace the adaptive threshold configuration and record the change.
    pub fn update_threshold_config(&self, config: &ThresholdConfig, actor: &str) {
        self.thresholds.save(config);
        self.ledger.append(
            AuditEvent::new(
                "Threshold Configuration Updated",
                AuditCategory::System,
                format!(
                    "Default threshold {}%. Night delta {:+.2}, weekend delta {:+.2}.",
                    (config.default_threshold * 100.0).round(),
                    config.night_shift_delta,
                    config.weekend_delta
                ),
            )
            .with_actor(actor),
        );
    }

    pub fn replace_integrations(&self, targets: &[IntegrationTarget], actor: &str) {
        self.integrations.save(targets);
        self.ledger.append(
            AuditEvent::new(
                "Integrations Updated",
                AuditCategory::Integration,
                format!("Configured integrations: {}", targets.len()),
            )
            .with_actor(actor),
        );
    }

    /// Aggregate heuristics-health view over history and feedback.
    pub fn monitoring_snapshot(&self) -> MonitoringSnapshot {
        MonitoringSnapshot::build(&self.history(), &self.feedback.load())
    }

    /// Append an arbitrary ledger entry on behalf of the caller.
    pub fn append_log(&self, event: AuditEvent) -> AuditLogEntry {
        self.ledger.append(event)
    }

    /// Audit entries, most recent first.
    pub fn audit_logs(&self) -> Vec<AuditLogEntry> {
        self.ledger.list()
    }

    /// Verify the stored ledger chain, or an externally supplied copy.
    pub fn verify_ledger(&self, entries: Option<&[AuditLogEntry]>) -> ChainVerification {
        self.ledger.verify(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::transaction::TransactionType;
    use chrono::NaiveDate;

    fn wednesday_afternoon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn service() -> ReviewService<MemoryStore> {
        let config = DetectionConfig {
            manual_threshold: 0.7,
            history_limit: 5,
            realtime_alerts: true,
            auto_lock: false,
        };
        ReviewService::new(Arc::new(MemoryStore::new()), &config)
    }

    fn safe_tx(id: &str) -> TransactionRecord {
        TransactionRecord::new(id, 400.0, TransactionType::Payment)
            .with_balances(2200.0, 1800.0, 100.0, 500.0)
    }

    #[test]
    fn test_score_blends_thresholds() {
        let service = service();
        let result = service.score(&safe_tx("tx_1"), wednesday_afternoon());

        // Adaptive PAYMENT baseline 0.72 blended with manual 0.7
        assert!((result.threshold_used - 0.71).abs() < 1e-9);
        assert!(!result.is_fraud());
    }

    #[test]
    fn test_history_is_bounded() {
        let service = service();
        for n in 0..8 {
            service.score(&safe_tx(&format!("tx_{n}")), wednesday_afternoon());
        }

        let history = service.history();
        assert_eq!(history.len(), 5);
        // Most recent first; oldest evicted
        assert_eq!(history[0].transaction.id, "tx_7");
        assert_eq!(history[4].transaction.id, "tx_3");
    }

    #[test]
    fn test_score_appends_audit_entry() {
        let service = service();
        service.score(&safe_tx("tx_1"), wednesday_afternoon());

        let logs = service.audit_logs();
        // Genesis + one scoring entry
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].action, "Transaction Scored");
        assert!(logs[0].details.starts_with("tx_1 -> Not Fraud"));
        assert_eq!(logs[0].status, AuditStatus::Success);

        let verification = service.verify_ledger(None);
        assert!(verification.is_valid);
        assert_eq!(verification.checked, 2);
    }

    #[test]
    fn test_fraud_score_entry_recorded_as_warning() {
        let service = service();
        let burst = TransactionRecord::new("tx_burst", 12000.0, TransactionType::CashOut)
            .with_balances(18000.0, 6000.0, 5000.0, 17000.0)
            .with_country("IN");

        let result = service.score(&burst, wednesday_afternoon());
        assert!(result.is_fraud());

        let logs = service.audit_logs();
        assert_eq!(logs[0].action, "Transaction Scored");
        assert_eq!(logs[0].status, AuditStatus::Warning);
    }

    #[test]
    fn test_auto_lock_entry_for_near_certain_fraud() {
        let config = DetectionConfig {
            manual_threshold: 0.7,
            history_limit: 5,
            realtime_alerts: true,
            auto_lock: true,
        };
        let service = ReviewService::new(Arc::new(MemoryStore::new()), &config);

        // Full drain with no destination credit: clamps to probability 1.0
        let extreme = TransactionRecord::new("tx_lock", 1_000_000.0, TransactionType::CashOut)
            .with_balances(1_000_000.0, 0.0, 0.0, 0.0);
        let result = service.score(&extreme, wednesday_afternoon());
        assert!(result.probability >= 0.95);

        let logs = service.audit_logs();
        assert_eq!(logs[0].action, "Auto-Lock Triggered");
        assert_eq!(logs[0].status, AuditStatus::Warning);
        assert_eq!(logs[1].action, "Transaction Scored");
        assert_eq!(logs[1].status, AuditStatus::Warning);
    }

    #[test]
    fn test_rule_update_audited() {
        let service = service();
        let mut rules = service.rules();
        rules[0].enabled = false;
        service.update_rules(&rules, "admin");

        assert!(!service.rules()[0].enabled);
        let logs = service.audit_logs();
        assert_eq!(logs[0].action, "Rules Updated");
        assert_eq!(logs[0].actor, "admin");
        assert!(logs[0].details.contains("Active rules: 3"));
    }

    #[test]
    fn test_feedback_audited() {
        let service = service();
        let result = service.score(&safe_tx("tx_1"), wednesday_afternoon());
        service.submit_feedback("tx_1", FeedbackLabel::FalsePositive, &result, "ana");

        let snapshot = service.monitoring_snapshot();
        assert_eq!(snapshot.labeled_count, 1);
        assert_eq!(snapshot.false_positive, 1);

        let logs = service.audit_logs();
        assert_eq!(logs[0].action, "Analyst Feedback Submitted");
        assert!(logs[0].details.contains("False Positive"));
    }

    #[tokio::test]
    async fn test_dispatch_skipped_for_clean_verdicts() {
        let service = service();
        let tx = safe_tx("tx_1");
        let result = service.score(&tx, wednesday_afternoon());
        let outcomes = service.dispatch_alerts(&tx, &result).await;
        assert!(outcomes.is_empty());
    }
}
