//! Key-value store implementations

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable store collaborator
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing was ever saved under `key`
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;
}

/// Load and decode a typed record
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.load(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode and save a typed record
pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    record: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(record)?;
    store.save(key, &value)
}

/// Process-local store (tests, ephemeral runs)
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// One pretty-printed JSON file per key under a root directory.
///
/// Keys containing `/` map to subdirectories.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_round_trip_and_absent() {
        let store = MemoryStore::new();
        assert!(store.load("user-storage").unwrap().is_none());

        store.save("user-storage", &json!({ "balance": 1.5 })).unwrap();
        let value = store.load("user-storage").unwrap().unwrap();
        assert_eq!(value["balance"], 1.5);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_nested_keys() {
        let dir = std::env::temp_dir().join(format!(
            "reward-arcade-store-{}-{}",
            std::process::id(),
            line!()
        ));
        let store = FileStore::open(&dir).unwrap();

        store
            .save("game-highscores/space-shooter", &json!({ "scores": [] }))
            .unwrap();
        assert!(dir.join("game-highscores/space-shooter.json").exists());

        let loaded = store.load("game-highscores/space-shooter").unwrap();
        assert_eq!(loaded, Some(json!({ "scores": [] })));
        assert!(store.load("missing").unwrap().is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_json_reports_malformed_records() {
        let store = MemoryStore::new();
        store.save("settings", &json!("not an object")).unwrap();
        let result: Result<Option<HashMap<String, u32>>, _> = load_json(&store, "settings");
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
