//! Fraud Review Engine - Main Entry Point
//!
//! Scores a batch of transactions through the full review pipeline:
//! adaptive thresholds, rule evaluation, alert dispatch for fraud
//! verdicts, and a hash-chained audit trail on disk.

use anyhow::Result;
use chrono::Local;
use fraud_review_engine::{
    config::AppConfig, service::ReviewService, storage::JsonFileStore,
    types::transaction::{TransactionRecord, TransactionType},
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_review_engine=info".parse()?),
        )
        .init();

    info!("Starting Fraud Review Engine");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");
    info!(
        "Manual threshold: {:.2}, history limit: {}, realtime alerts: {}",
        config.detection.manual_threshold,
        config.detection.history_limit,
        config.detection.realtime_alerts
    );

    let store = Arc::new(JsonFileStore::new(&config.storage.data_dir)?);
    let service = ReviewService::new(store, &config.detection);
    info!("Review service initialized, data dir: {}", config.storage.data_dir);

    let transactions = load_transactions()?;
    info!("Scoring {} transactions", transactions.len());

    let now = Local::now().naive_local();
    for tx in &transactions {
        let result = service.score(tx, now);
        info!(
            "{} {} {:.2} -> {} ({:.1}% risk, threshold {:.1}%)",
            tx.id,
            tx.tx_type,
            tx.amount,
            result.verdict,
            result.probability * 100.0,
            result.threshold_used * 100.0
        );

        if result.is_fraud() {
            let outcomes = service.dispatch_alerts(tx, &result).await;
            for outcome in outcomes {
                if outcome.ok {
                    info!("Alert delivered to {}", outcome.target_name);
                } else {
                    warn!("Alert to {} failed: {}", outcome.target_name, outcome.message);
                }
            }
        }
    }

    let verification = service.verify_ledger(None);
    if verification.is_valid {
        info!("Audit chain verified: {} entries intact", verification.checked);
    } else {
        warn!(
            "Audit chain broken at entry {:?} after {} checks",
            verification.broken_at, verification.checked
        );
    }

    let snapshot = service.monitoring_snapshot();
    info!(
        "Monitoring: {} predictions, average risk {:.1}%, drift {:.1}%",
        snapshot.total_predictions, snapshot.average_risk, snapshot.drift_score
    );

    service.metrics().print_summary();

    Ok(())
}

/// Read transactions from a JSON file given as the first argument, or fall
/// back to a built-in demo batch.
fn load_transactions() -> Result<Vec<TransactionRecord>> {
    if let Some(path) = std::env::args().nth(1) {
        let raw = std::fs::read_to_string(&path)?;
        let parsed: Vec<TransactionRecord> = serde_json::from_str(&raw)?;
        info!("Loaded {} transactions from {}", parsed.len(), path);
        return Ok(parsed);
    }

    Ok(vec![
        TransactionRecord::new("tx_demo_001", 420.0, TransactionType::Payment)
            .with_balances(2600.0, 2180.0, 310.0, 730.0)
            .with_country("US"),
        TransactionRecord::new("tx_demo_002", 18500.0, TransactionType::CashOut)
            .with_balances(19000.0, 500.0, 0.0, 18500.0)
            .with_country("IN"),
        TransactionRecord::new("tx_demo_003", 9800.0, TransactionType::Transfer)
            .with_balances(9800.0, 0.0, 120.0, 9920.0)
            .with_country("GB"),
        TransactionRecord::new("tx_demo_004", 1500.0, TransactionType::CashIn)
            .with_balances(800.0, 2300.0, 5000.0, 3500.0)
            .with_country("US"),
        TransactionRecord::new("tx_demo_005", 75.0, TransactionType::Debit)
            .with_balances(1200.0, 1125.0, 0.0, 75.0),
    ])
}
