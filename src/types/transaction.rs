//! Transaction data structures for fraud scoring

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction type, matching the PaySim-style dataset the scoring heuristics
/// were tuned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    CashOut,
    Transfer,
    Payment,
    CashIn,
    Debit,
}

impl TransactionType {
    /// All known transaction types, in display order.
    pub const ALL: [TransactionType; 5] = [
        TransactionType::CashOut,
        TransactionType::Transfer,
        TransactionType::Payment,
        TransactionType::CashIn,
        TransactionType::Debit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Payment => "PAYMENT",
            TransactionType::CashIn => "CASH_IN",
            TransactionType::Debit => "DEBIT",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction submitted for review. Immutable once created; the scorer and
/// rule engine only read from it.
///
/// Amount is expected to be non-negative and all balances finite; validation
/// happens upstream at the submission boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique transaction identifier
    pub id: String,

    /// Submission timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Monetary amount (non-negative)
    pub amount: f64,

    /// Transaction type
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Origin account balance before the transaction
    pub origin_balance_before: f64,

    /// Origin account balance after the transaction
    pub origin_balance_after: f64,

    /// Destination account balance before the transaction
    pub dest_balance_before: f64,

    /// Destination account balance after the transaction
    pub dest_balance_after: f64,

    /// Optional ISO country code for corridor-sensitive rules and thresholds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl TransactionRecord {
    /// Create a transaction with the required fields; balances default to zero.
    pub fn new(id: impl Into<String>, amount: f64, tx_type: TransactionType) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            amount,
            tx_type,
            origin_balance_before: 0.0,
            origin_balance_after: 0.0,
            dest_balance_before: 0.0,
            dest_balance_after: 0.0,
            country: None,
        }
    }

    /// Builder-style balance assignment.
    pub fn with_balances(
        mut self,
        origin_before: f64,
        origin_after: f64,
        dest_before: f64,
        dest_after: f64,
    ) -> Self {
        self.origin_balance_before = origin_before;
        self.origin_balance_after = origin_after;
        self.dest_balance_before = dest_before;
        self.dest_balance_after = dest_after;
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Fraction of the origin balance removed by this transaction, in [0, 1].
    /// Zero when the origin account had no funds to begin with.
    pub fn drain_ratio(&self) -> f64 {
        if self.origin_balance_before <= 0.0 {
            return 0.0;
        }
        let origin_delta = self.origin_balance_before - self.origin_balance_after;
        (origin_delta / self.origin_balance_before).clamp(0.0, 1.0)
    }
}
