//! Key-value storage seam.
//!
//! The core never touches browser storage or the filesystem directly. Anything
//! that needs to persist (presets, undo snapshots) goes through a
//! [`KeyValueStore`] supplied by the embedding application.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// Minimal string key-value store (the shape of `localStorage`).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        (**self).remove(key)
    }
}

/// In-process store, used in tests and as a fallback when no durable store
/// is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> CoreError {
    CoreError::Storage("memory store lock poisoned".to_string())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.inner.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.inner
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.inner.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

/// Serialize `value` as JSON under `key`.
pub fn save_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), CoreError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Load and deserialize the JSON stored under `key`, if any.
pub fn load_json<S, T>(store: &S, key: &str) -> Result<Option<T>, CoreError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::history::{HistoryStack, HistoryState};

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.len(), 1);
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn remove_missing_key_is_ok() {
        assert!(MemoryStore::new().remove("nothing").is_ok());
    }

    #[test]
    fn history_snapshot_survives_store() {
        let store = MemoryStore::new();
        let mut history = HistoryStack::with_max_history("a".to_string(), 10);
        history.set_state("b".to_string());
        history.undo();
        save_json(&store, "editor:history", history.state()).unwrap();

        let restored: HistoryState<String> = load_json(&store, "editor:history").unwrap().unwrap();
        assert_eq!(restored.present, "a");
        assert_eq!(restored.future, VecDeque::from(vec!["b".to_string()]));

        let resumed = HistoryStack::from_state(restored, 10);
        assert!(resumed.can_redo());
    }

    #[test]
    fn load_json_reports_corrupt_data() {
        let store = MemoryStore::new();
        store.set("bad", "{not json").unwrap();
        let result: Result<Option<Vec<u8>>, _> = load_json(&store, "bad");
        assert!(matches!(result, Err(CoreError::Serialization(_))));
    }
}
