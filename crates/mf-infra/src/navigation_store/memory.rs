use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use mf_core::ports::{NavigationKey, NavigationStoreError, NavigationStorePort};

use super::NOTIFY_CAPACITY;

/// Process-local store. Used by tests and by hosts without a data dir.
pub struct InMemoryNavigationStore {
    entries: Mutex<HashMap<NavigationKey, serde_json::Value>>,
    changes: broadcast::Sender<NavigationKey>,
}

impl InMemoryNavigationStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, key: NavigationKey) {
        // No receivers is fine.
        let _ = self.changes.send(key);
    }
}

impl Default for InMemoryNavigationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationStorePort for InMemoryNavigationStore {
    fn get(&self, key: NavigationKey) -> Result<Option<serde_json::Value>, NavigationStoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| NavigationStoreError::Poisoned)?;
        Ok(entries.get(&key).cloned())
    }

    fn set(
        &self,
        key: NavigationKey,
        value: serde_json::Value,
    ) -> Result<(), NavigationStoreError> {
        self.entries
            .lock()
            .map_err(|_| NavigationStoreError::Poisoned)?
            .insert(key, value);
        self.notify(key);
        Ok(())
    }

    fn remove(&self, key: NavigationKey) -> Result<(), NavigationStoreError> {
        let removed = self
            .entries
            .lock()
            .map_err(|_| NavigationStoreError::Poisoned)?
            .remove(&key);
        if removed.is_some() {
            self.notify(key);
        }
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<NavigationKey>> {
        Some(self.changes.subscribe())
    }
}
