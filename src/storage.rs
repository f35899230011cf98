//! Key-value persistence for rules, thresholds, feedback, and the ledger
//!
//! Storage is a narrow get/set contract keyed by fixed slot identifiers.
//! Writes are best-effort: failures are logged and swallowed so a scoring
//! call never fails because a persisted copy could not be saved. Reads that
//! yield malformed payloads fall back to the built-in defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::threshold::{clamp_threshold, ThresholdConfig};
use crate::types::rule::{default_rules, RuleDefinition};

/// Storage slot for the persisted rule set.
pub const RULES_KEY: &str = "rules.v1";
/// Storage slot for the persisted threshold configuration.
pub const THRESHOLD_KEY: &str = "threshold.config.v1";
/// Storage slot for the audit ledger chain.
pub const AUDIT_LOG_KEY: &str = "audit.logs.v1";
/// Storage slot for analyst feedback.
pub const FEEDBACK_KEY: &str = "feedback.v1";
/// Storage slot for alert integration targets.
pub const INTEGRATIONS_KEY: &str = "integrations.v1";

/// Abstract string-slot persistence. Implementations must tolerate write
/// failures internally; `set` never surfaces an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots
            .read()
            .ok()
            .and_then(|slots| slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut slots) = self.slots.write() {
            slots.insert(key.to_string(), value.to_string());
        }
    }
}

/// File-backed store keeping one JSON document per slot under a data
/// directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read storage slot");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::write(self.path_for(key), value) {
            warn!(key = %key, error = %e, "Failed to persist storage slot, keeping in-memory copy only");
        }
    }
}

/// Read a slot and deserialize it, falling back to `fallback` on a missing
/// or malformed payload.
pub(crate) fn load_or<T, S, F>(store: &S, key: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
    F: FnOnce() -> T,
{
    match store.get(key) {
        Some(raw) => match serde_json::from_str::<T>(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding malformed persisted payload, using defaults");
                fallback()
            }
        },
        None => fallback(),
    }
}

/// Serialize and persist a slot, best-effort.
pub(crate) fn persist<T, S>(store: &S, key: &str, value: &T)
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    match serde_json::to_string(value) {
        Ok(raw) => {
            store.set(key, &raw);
            debug!(key = %key, "Persisted storage slot");
        }
        Err(e) => warn!(key = %key, error = %e, "Failed to serialize storage slot"),
    }
}

/// Repository for the administrator-authored rule set.
pub struct RuleStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> RuleStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Load the rule set; an empty or malformed slot yields the defaults.
    pub fn load(&self) -> Vec<RuleDefinition> {
        let rules: Vec<RuleDefinition> = load_or(&*self.store, RULES_KEY, default_rules);
        if rules.is_empty() {
            default_rules()
        } else {
            rules
        }
    }

    pub fn save(&self, rules: &[RuleDefinition]) {
        persist(&*self.store, RULES_KEY, &rules);
    }
}

/// Repository for the adaptive threshold configuration.
pub struct ThresholdStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> ThresholdStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> ThresholdConfig {
        let mut config: ThresholdConfig =
            load_or(&*self.store, THRESHOLD_KEY, ThresholdConfig::default);
        config.default_threshold = clamp_threshold(config.default_threshold);
        config
    }

    pub fn save(&self, config: &ThresholdConfig) {
        persist(&*self.store, THRESHOLD_KEY, config);
    }
}
