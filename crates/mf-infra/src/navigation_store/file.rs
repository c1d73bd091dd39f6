//! File-based navigation store
//!
//! 将导航标志持久化为应用数据目录中的单个 JSON 对象文件。
//! Persists every key as a field of one JSON object. Each write replaces the
//! file through a temp file and rename, so a crash never leaves half a
//! document behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use mf_core::ports::{NavigationKey, NavigationStoreError, NavigationStorePort};

use super::NOTIFY_CAPACITY;

pub const DEFAULT_NAVIGATION_STATE_FILE: &str = "navigation_state.json";

pub struct FileNavigationStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
    changes: broadcast::Sender<NavigationKey>,
}

impl FileNavigationStore {
    /// Create store with custom file path
    pub fn new(path: PathBuf) -> Self {
        let (changes, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            path,
            write_lock: Mutex::new(()),
            changes,
        }
    }

    /// Create store with defaults
    pub fn with_defaults(base_dir: &Path) -> Self {
        Self::new(base_dir.join(DEFAULT_NAVIGATION_STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<(), NavigationStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<Map<String, Value>, NavigationStoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(NavigationStoreError::Corrupt(format!(
                "expected a JSON object, found {}",
                kind_of(&other)
            ))),
            Err(e) => Err(NavigationStoreError::Corrupt(format!(
                "Failed to parse navigation state: {e}"
            ))),
        }
    }

    /// Like `load`, but a corrupt document is replaced instead of failing
    /// every later write.
    fn load_for_write(&self) -> Result<Map<String, Value>, NavigationStoreError> {
        match self.load() {
            Err(NavigationStoreError::Corrupt(reason)) => {
                warn!(path = %self.path.display(), %reason, "resetting corrupt navigation state");
                Ok(Map::new())
            }
            other => other,
        }
    }

    fn persist(&self, map: &Map<String, Value>) -> Result<(), NavigationStoreError> {
        self.ensure_parent_dir()?;
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| NavigationStoreError::Corrupt(format!("Failed to serialize: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, key: NavigationKey, mutate: F) -> Result<(), NavigationStoreError>
    where
        F: FnOnce(&mut Map<String, Value>) -> bool,
    {
        let changed = {
            let _guard = self
                .write_lock
                .lock()
                .map_err(|_| NavigationStoreError::Poisoned)?;
            let mut map = self.load_for_write()?;
            let changed = mutate(&mut map);
            if changed {
                self.persist(&map)?;
            }
            changed
        };
        if changed {
            debug!(%key, "navigation state updated");
            let _ = self.changes.send(key);
        }
        Ok(())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl NavigationStorePort for FileNavigationStore {
    fn get(&self, key: NavigationKey) -> Result<Option<Value>, NavigationStoreError> {
        let map = self.load()?;
        Ok(map.get(key.as_str()).cloned())
    }

    fn set(&self, key: NavigationKey, value: Value) -> Result<(), NavigationStoreError> {
        self.update(key, |map| {
            map.insert(key.as_str().to_string(), value);
            true
        })
    }

    fn remove(&self, key: NavigationKey) -> Result<(), NavigationStoreError> {
        self.update(key, |map| map.remove(key.as_str()).is_some())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<NavigationKey>> {
        Some(self.changes.subscribe())
    }
}
