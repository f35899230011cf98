//! Hash-chained audit ledger
//!
//! Every consequential action is appended as a tamper-evident entry: each
//! entry's hash covers its own fields plus the previous entry's hash, rooted
//! at a fixed genesis hash. Editing, deleting, or reordering any entry breaks
//! at least one link, which `verify` detects by recomputing the walk.
//!
//! The backing store is a single slot holding the serialized chain, so append
//! is a read-modify-write sequence. A mutex serializes appends to keep the
//! chain complete under concurrent writers.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::storage::{load_or, persist, KeyValueStore, AUDIT_LOG_KEY};
use crate::types::audit::{AuditCategory, AuditEvent, AuditLogEntry, AuditStatus};

/// Root of the hash chain: 64 zero characters.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Canonical hash input. Field order is fixed by this declaration; the same
/// serialization is recomputed during verification, so it must never change.
#[derive(Serialize)]
struct HashedFields<'a> {
    id: &'a str,
    timestamp: &'a str,
    actor: &'a str,
    action: &'a str,
    category: AuditCategory,
    details: &'a str,
    address: &'a str,
    status: AuditStatus,
    prev_hash: &'a str,
}

fn entry_hash(entry: &AuditLogEntry) -> String {
    let canonical = serde_json::to_string(&HashedFields {
        id: &entry.id,
        timestamp: &entry.timestamp,
        actor: &entry.actor,
        action: &entry.action,
        category: entry.category,
        details: &entry.details,
        address: &entry.address,
        status: entry.status,
        prev_hash: &entry.prev_hash,
    })
    .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Outcome of a chain verification walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    pub is_valid: bool,
    /// Identifier of the first entry whose hash or linkage failed
    pub broken_at: Option<String>,
    /// Number of entries examined, inclusive of a failing one
    pub checked: usize,
}

/// Append-only audit ledger over an injected key-value store.
pub struct AuditLedger<S: KeyValueStore> {
    store: Arc<S>,
    /// Serializes the read-modify-write append sequence
    append_lock: Mutex<()>,
    default_actor: String,
    default_address: String,
}

impl<S: KeyValueStore> AuditLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
            default_actor: "system".to_string(),
            default_address: "127.0.0.1".to_string(),
        }
    }

    /// Attribute entries without an explicit actor to this identity instead
    /// of "system".
    pub fn with_default_actor(mut self, actor: impl Into<String>) -> Self {
        self.default_actor = actor.into();
        self
    }

    fn read_chain(&self) -> Vec<AuditLogEntry> {
        load_or(&*self.store, AUDIT_LOG_KEY, Vec::new)
    }

    fn build_entry(&self, event: AuditEvent, prev_hash: String) -> AuditLogEntry {
        let suffix: String = Uuid::new_v4().simple().to_string()[..5].to_uppercase();
        let mut entry = AuditLogEntry {
            id: format!("LOG-{}-{}", Utc::now().timestamp_millis(), suffix),
            timestamp: Utc::now().to_rfc3339(),
            actor: event.actor.unwrap_or_else(|| self.default_actor.clone()),
            action: event.action,
            category: event.category.unwrap_or(AuditCategory::System),
            details: event.details,
            address: event.address.unwrap_or_else(|| self.default_address.clone()),
            status: event.status,
            prev_hash,
            hash: String::new(),
        };
        entry.hash = entry_hash(&entry);
        entry
    }

    /// Create the genesis entry if the chain is empty. Idempotent: a no-op
    /// once any entry exists.
    pub fn ensure_initialized(&self) {
        let _guard = self.append_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.initialize_locked();
    }

    /// Genesis creation; callers must hold `append_lock`.
    fn initialize_locked(&self) {
        if !self.read_chain().is_empty() {
            return;
        }

        let genesis = self.build_entry(
            AuditEvent::new(
                "Audit Ledger Initialized",
                AuditCategory::System,
                "Created immutable audit chain for this workspace.",
            )
            .with_actor("system"),
            GENESIS_HASH.to_string(),
        );
        persist(&*self.store, AUDIT_LOG_KEY, &vec![genesis]);
        debug!("Audit ledger genesis entry created");
    }

    /// Append an entry to the chain. Never fails: persistence errors are
    /// swallowed at the storage boundary and the built entry is returned
    /// regardless.
    pub fn append(&self, event: AuditEvent) -> AuditLogEntry {
        let _guard = self.append_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.initialize_locked();

        let mut chain = self.read_chain();
        let prev_hash = chain
            .last()
            .map(|entry| entry.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let entry = self.build_entry(event, prev_hash);
        chain.push(entry.clone());
        persist(&*self.store, AUDIT_LOG_KEY, &chain);

        debug!(id = %entry.id, action = %entry.action, "Audit entry appended");
        entry
    }

    /// All entries, most recent first.
    pub fn list(&self) -> Vec<AuditLogEntry> {
        let mut chain = self.read_chain();
        chain.reverse();
        chain
    }

    /// Verify the stored chain, or an externally supplied one given most
    /// recent first (as returned by [`list`](Self::list)).
    ///
    /// Walks oldest to newest from the genesis hash, recomputing each entry's
    /// hash and checking its linkage; stops at the first mismatch. Integrity
    /// failures are reported, never raised.
    pub fn verify(&self, entries: Option<&[AuditLogEntry]>) -> ChainVerification {
        let ascending: Vec<AuditLogEntry> = match entries {
            Some(desc) => desc.iter().rev().cloned().collect(),
            None => self.read_chain(),
        };

        let mut expected_prev = GENESIS_HASH.to_string();
        for (i, entry) in ascending.iter().enumerate() {
            let recomputed = entry_hash(entry);
            if entry.prev_hash != expected_prev || entry.hash != recomputed {
                return ChainVerification {
                    is_valid: false,
                    broken_at: Some(entry.id.clone()),
                    checked: i + 1,
                };
            }
            expected_prev = entry.hash.clone();
        }

        ChainVerification {
            is_valid: true,
            broken_at: None,
            checked: ascending.len(),
        }
    }
}
