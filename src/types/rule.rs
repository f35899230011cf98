//! Administrator-authored override rules applied after base scoring

use serde::{Deserialize, Serialize};

use crate::types::transaction::TransactionType;

/// Rule severity, used to derive a default score boost when none is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Default boost magnitude for boost-score rules without an explicit boost.
    pub fn default_boost(&self) -> f64 {
        match self {
            Severity::Critical => 0.12,
            Severity::High => 0.08,
            Severity::Medium => 0.05,
            Severity::Low => 0.03,
        }
    }
}

/// What a matching rule does to the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    BoostScore,
    ForceFraud,
    ForceReview,
}

/// Transaction-type filter. `Any` matches every type; persisted as the
/// literal string `"ANY"` for compatibility with stored rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TypeFilter {
    #[default]
    #[serde(rename = "ANY")]
    Any,
    #[serde(untagged)]
    Only(TransactionType),
}

impl TypeFilter {
    pub fn allows(&self, tx_type: TransactionType) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Only(t) => *t == tx_type,
        }
    }
}

/// Country filter. `Any` matches every transaction; a concrete code only
/// matches when a country was supplied and is equal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CountryFilter {
    #[default]
    #[serde(rename = "ANY")]
    Any,
    #[serde(untagged)]
    Only(String),
}

impl CountryFilter {
    pub fn allows(&self, country: Option<&str>) -> bool {
        match self {
            CountryFilter::Any => true,
            CountryFilter::Only(code) => country == Some(code.as_str()),
        }
    }
}

/// A named condition-action override rule. All filters are optional; a rule
/// matches when every present filter passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub severity: Severity,
    pub action: RuleAction,

    /// Explicit boost magnitude for boost-score rules; severity-derived when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,

    /// Minimum transaction amount for the rule to apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,

    /// Transaction-type filter
    #[serde(default)]
    pub transaction_type: TypeFilter,

    /// Country filter
    #[serde(default)]
    pub country: CountryFilter,

    /// Minimum origin drain ratio (0-1) for the rule to apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_velocity: Option<f64>,
}

impl RuleDefinition {
    /// The boost this rule applies when it matches: zero for non-boost
    /// actions, the explicit boost or severity default otherwise.
    pub fn effective_boost(&self) -> f64 {
        if self.action != RuleAction::BoostScore {
            return 0.0;
        }
        self.boost.unwrap_or_else(|| self.severity.default_boost())
    }
}

/// A record of one rule firing against a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule_id: String,
    pub rule_name: String,
    pub action: RuleAction,
    pub boost_applied: f64,
    pub reason: String,
}

/// Rule set shipped with a fresh workspace, mirroring common fraud-ops
/// starting points.
pub fn default_rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            id: "rule-cashout-large".to_string(),
            name: "Large Cash-Out Burst".to_string(),
            enabled: true,
            severity: Severity::Critical,
            action: RuleAction::BoostScore,
            boost: Some(0.12),
            min_amount: Some(10000.0),
            transaction_type: TypeFilter::Only(TransactionType::CashOut),
            country: CountryFilter::Any,
            min_velocity: None,
        },
        RuleDefinition {
            id: "rule-transfer-highrisk-country".to_string(),
            name: "High-Risk Corridor Transfer".to_string(),
            enabled: true,
            severity: Severity::High,
            action: RuleAction::BoostScore,
            boost: Some(0.1),
            min_amount: Some(3000.0),
            transaction_type: TypeFilter::Only(TransactionType::Transfer),
            country: CountryFilter::Only("IN".to_string()),
            min_velocity: None,
        },
        RuleDefinition {
            id: "rule-origin-drain".to_string(),
            name: "Origin Balance Fully Drained".to_string(),
            enabled: true,
            severity: Severity::High,
            action: RuleAction::ForceReview,
            boost: None,
            min_amount: None,
            transaction_type: TypeFilter::Any,
            country: CountryFilter::Any,
            min_velocity: Some(0.92),
        },
        RuleDefinition {
            id: "rule-money-mule-pattern".to_string(),
            name: "Likely Mule Funnel Pattern".to_string(),
            enabled: true,
            severity: Severity::Critical,
            action: RuleAction::ForceFraud,
            boost: None,
            min_amount: Some(25000.0),
            transaction_type: TypeFilter::Only(TransactionType::Transfer),
            country: CountryFilter::Any,
            min_velocity: None,
        },
    ]
}
