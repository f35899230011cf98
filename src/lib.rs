//! Fraud Review Engine Library
//!
//! A deterministic risk-decision engine for payment fraud review:
//! heuristic scoring, a configurable rule layer, context-adaptive
//! thresholds, and a hash-chained audit ledger over pluggable storage.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod feedback;
pub mod ledger;
pub mod metrics;
pub mod service;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use engine::scoring::score_transaction;
pub use engine::threshold::ThresholdConfig;
pub use ledger::AuditLedger;
pub use metrics::ReviewMetrics;
pub use service::ReviewService;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{
    prediction::PredictionResult,
    rule::RuleDefinition,
    transaction::{TransactionRecord, TransactionType},
};
