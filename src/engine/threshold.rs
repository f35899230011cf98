//! Adaptive decision-threshold resolution
//!
//! The operative threshold for a transaction is layered: the configured
//! default, replaced by a per-type baseline when one exists, averaged with a
//! per-country baseline when one applies, then shifted by night and weekend
//! deltas. The result is always clamped to [MIN_THRESHOLD, MAX_THRESHOLD].

use std::collections::HashMap;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::transaction::{TransactionRecord, TransactionType};

/// Lower clamp bound for any resolved threshold.
pub const MIN_THRESHOLD: f64 = 0.35;
/// Upper clamp bound for any resolved threshold.
pub const MAX_THRESHOLD: f64 = 0.95;

/// Layered threshold configuration, administrator-edited and persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub default_threshold: f64,
    pub by_type: HashMap<TransactionType, f64>,
    pub by_country: HashMap<String, f64>,
    pub night_shift_delta: f64,
    pub weekend_delta: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let mut by_type = HashMap::new();
        by_type.insert(TransactionType::CashOut, 0.6);
        by_type.insert(TransactionType::Transfer, 0.62);
        by_type.insert(TransactionType::Payment, 0.72);
        by_type.insert(TransactionType::CashIn, 0.78);
        by_type.insert(TransactionType::Debit, 0.74);

        let mut by_country = HashMap::new();
        by_country.insert("US".to_string(), 0.7);
        by_country.insert("IN".to_string(), 0.68);
        by_country.insert("GB".to_string(), 0.71);
        by_country.insert("EU".to_string(), 0.72);

        Self {
            default_threshold: 0.7,
            by_type,
            by_country,
            night_shift_delta: -0.05,
            weekend_delta: -0.03,
        }
    }
}

/// A resolved threshold with the context notes that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedThreshold {
    pub threshold: f64,
    pub notes: Vec<String>,
}

pub fn clamp_threshold(value: f64) -> f64 {
    value.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

/// Resolve the adaptive threshold for a transaction at a given wall-clock
/// time. Night shift is any hour before 6 or at/after 22; weekend is
/// Saturday or Sunday.
pub fn resolve_threshold(
    tx: &TransactionRecord,
    config: &ThresholdConfig,
    country: Option<&str>,
    now: NaiveDateTime,
) -> ResolvedThreshold {
    let mut notes = Vec::new();
    let mut threshold = config.default_threshold;

    if let Some(&type_threshold) = config.by_type.get(&tx.tx_type) {
        threshold = type_threshold;
        notes.push(format!("Type baseline: {}%", (type_threshold * 100.0).round()));
    }

    if let Some(code) = country {
        if let Some(&country_threshold) = config.by_country.get(code) {
            threshold = (threshold + country_threshold) / 2.0;
            notes.push(format!("Country adjustment: {code}"));
        }
    }

    let hour = now.hour();
    if hour < 6 || hour >= 22 {
        threshold += config.night_shift_delta;
        notes.push("Night shift profile".to_string());
    }

    let weekday = now.weekday();
    if weekday == Weekday::Sat || weekday == Weekday::Sun {
        threshold += config.weekend_delta;
        notes.push("Weekend profile".to_string());
    }

    ResolvedThreshold {
        threshold: clamp_threshold(threshold),
        notes,
    }
}

/// Blend the adaptive threshold with the manually configured review threshold.
/// This mirrors the application layer's policy of weighting both equally.
pub fn blend_with_manual(resolved: f64, manual: f64) -> f64 {
    clamp_threshold((manual + resolved) / 2.0)
}
