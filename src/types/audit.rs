//! Audit ledger entry data structures

use serde::{Deserialize, Serialize};

/// Functional area an audit entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Auth,
    Case,
    System,
    Report,
    Risk,
    Rules,
    Integration,
    Model,
}

/// Outcome recorded with an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuditStatus {
    #[default]
    Success,
    Failed,
    Warning,
}

/// One tamper-evident ledger record. Entries are never edited or removed;
/// each commits to the previous entry's hash, rooted at the genesis hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,

    /// ISO-8601 timestamp
    pub timestamp: String,

    /// Attributed operator, or "system"
    pub actor: String,

    pub action: String,
    pub category: AuditCategory,
    pub details: String,

    /// Source address the action originated from
    pub address: String,

    pub status: AuditStatus,

    /// Hash of the previous entry in the chain
    pub prev_hash: String,

    /// Hash over this entry's own fields, including prev_hash
    pub hash: String,
}

/// Parameters for appending a ledger entry. Actor and address fall back to
/// the ledger's defaults when omitted.
#[derive(Debug, Clone, Default)]
pub struct AuditEvent {
    pub action: String,
    pub category: Option<AuditCategory>,
    pub details: String,
    pub status: AuditStatus,
    pub actor: Option<String>,
    pub address: Option<String>,
}

impl AuditEvent {
    pub fn new(
        action: impl Into<String>,
        category: AuditCategory,
        details: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            category: Some(category),
            details: details.into(),
            status: AuditStatus::Success,
            actor: None,
            address: None,
        }
    }

    pub fn with_status(mut self, status: AuditStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}
