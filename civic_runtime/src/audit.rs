//! Audit log: administrative actions, stored as JSON in a store list.

use std::sync::Arc;

use civic_engine::domain::AuditEntry;

use crate::store::{KeyValueStore, StoreError, AUDIT_LOG_KEY};

#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl AuditLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, AUDIT_LOG_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    pub fn record(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_string(entry).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.store.lpush(&self.key, &encoded)
    }

    /// Every entry, newest first.
    pub fn entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        self.store
            .lrange(&self.key, 0, -1)?
            .iter()
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| StoreError::Corrupt(format!("bad audit entry: {}", e)))
            })
            .collect()
    }
}
