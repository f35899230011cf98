//! Simulated alert delivery to configured integration targets
//!
//! No real network calls are made: delivery is mocked with a short latency
//! and a deterministic success function so demo runs are reproducible. The
//! caller records each outcome in the audit ledger.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::storage::{load_or, persist, KeyValueStore, INTEGRATIONS_KEY};
use crate::types::prediction::PredictionResult;
use crate::types::transaction::TransactionRecord;

/// Kind of downstream alert channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationType {
    Slack,
    Teams,
    Webhook,
    Email,
}

/// A configured alert destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationTarget {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: IntegrationType,
    pub endpoint: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Result of one simulated delivery attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub target_id: String,
    pub target_name: String,
    pub ok: bool,
    pub message: String,
    pub sent_at: String,
}

/// Targets shipped with a fresh workspace, disabled until an administrator
/// opts in.
pub fn default_integrations() -> Vec<IntegrationTarget> {
    vec![
        IntegrationTarget {
            id: "int-slack-soc".to_string(),
            name: "SOC Slack Channel".to_string(),
            target_type: IntegrationType::Slack,
            endpoint: "https://hooks.slack.com/services/demo/example".to_string(),
            enabled: false,
            secret: None,
        },
        IntegrationTarget {
            id: "int-teams-fraud".to_string(),
            name: "Fraud Ops Teams".to_string(),
            target_type: IntegrationType::Teams,
            endpoint: "https://outlook.office.com/webhook/demo/example".to_string(),
            enabled: false,
            secret: None,
        },
    ]
}

/// Repository for integration targets.
pub struct IntegrationStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> IntegrationStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Vec<IntegrationTarget> {
        let targets: Vec<IntegrationTarget> =
            load_or(&*self.store, INTEGRATIONS_KEY, default_integrations);
        if targets.is_empty() {
            default_integrations()
        } else {
            targets
        }
    }

    pub fn save(&self, targets: &[IntegrationTarget]) {
        persist(&*self.store, INTEGRATIONS_KEY, &targets);
    }
}

fn validate_target(target: &IntegrationTarget) -> Option<String> {
    let endpoint = target.endpoint.trim();
    if endpoint.is_empty() {
        return Some("Endpoint URL is empty.".to_string());
    }
    let lowered = endpoint.to_ascii_lowercase();
    if !lowered.starts_with("http://") && !lowered.starts_with("https://") {
        return Some("Endpoint must start with http:// or https://".to_string());
    }
    None
}

async fn simulate_dispatch(
    target: &IntegrationTarget,
    payload: &serde_json::Value,
) -> DispatchOutcome {
    tokio::time::sleep(Duration::from_millis(200)).await;

    if let Some(validation_error) = validate_target(target) {
        return DispatchOutcome {
            target_id: target.id.clone(),
            target_name: target.name.clone(),
            ok: false,
            message: validation_error,
            sent_at: Utc::now().to_rfc3339(),
        };
    }

    // Deterministic mock delivery keyed on endpoint length, so demo runs
    // are predictable
    let success = target.endpoint.len() % 5 != 0;
    debug!(target = %target.name, ok = success, payload = %payload, "Simulated dispatch");

    DispatchOutcome {
        target_id: target.id.clone(),
        target_name: target.name.clone(),
        ok: success,
        message: if success {
            "Alert payload accepted by integration endpoint.".to_string()
        } else {
            "Endpoint rejected payload (simulated 4xx).".to_string()
        },
        sent_at: Utc::now().to_rfc3339(),
    }
}

/// Send a synthetic test alert to a single target.
pub async fn send_test_alert(target: &IntegrationTarget) -> DispatchOutcome {
    let payload = json!({
        "event": "integration.test",
        "message": "Fraud review test alert",
        "timestamp": Utc::now().to_rfc3339(),
    });
    simulate_dispatch(target, &payload).await
}

/// Fan out a high-risk alert to every enabled target.
pub async fn dispatch_high_risk_alert(
    tx: &TransactionRecord,
    result: &PredictionResult,
    targets: &[IntegrationTarget],
) -> Vec<DispatchOutcome> {
    let enabled: Vec<&IntegrationTarget> = targets.iter().filter(|t| t.enabled).collect();
    if enabled.is_empty() {
        return Vec::new();
    }

    let payload = json!({
        "event": "fraud.high_risk_detected",
        "transaction_id": tx.id,
        "country": tx.country.as_deref().unwrap_or("UNKNOWN"),
        "amount": tx.amount,
        "type": tx.tx_type,
        "risk": (result.probability * 100.0).round() as i64,
        "verdict": result.verdict,
        "timestamp": Utc::now().to_rfc3339(),
    });

    let mut outcomes = Vec::with_capacity(enabled.len());
    for target in enabled {
        outcomes.push(simulate_dispatch(target, &payload).await);
    }
    outcomes
}
