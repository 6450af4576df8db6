//! In-memory store backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::errors::{Result, StoreError};
use crate::store::SettingsStore;

/// A process-local store, shared by cloning an `Arc`.
///
/// Can be switched into an unavailable state to exercise the degraded paths
/// of the components that read it.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<Map<String, Value>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a key before the store is shared.
    #[must_use]
    pub fn with(self, key: &str, value: Value) -> Self {
        let _ = self.values.write().insert(key.to_owned(), value);
        self
    }

    /// Make every subsequent read and write fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Current value of `key`, bypassing the async API.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        self.check_available()?;
        let values = self.values.read();
        Ok(keys
            .iter()
            .filter_map(|k| values.get(*k).map(|v| ((*k).to_owned(), v.clone())))
            .collect())
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<()> {
        self.check_available()?;
        self.values.write().extend(entries);
        let _ = self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
