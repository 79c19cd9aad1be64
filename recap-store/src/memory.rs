use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::{DeleteStatus, Store, StoreResult};

/// In-memory [`Store`] backed by a concurrent map.
///
/// The default backend: unbounded, process-local, with per-key atomic
/// replacement. Cloning is cheap and every clone shares the same entries.
/// For a bounded variant with eviction, use the `recap-moka` backend.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus> {
        match self.entries.remove(key) {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        let value = Bytes::from_static(b"\x00\x01binary\xff");

        store.set("key", value.clone()).await.unwrap();

        assert!(store.has("key").await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let store = MemoryStore::new();

        store.set("key", Bytes::from_static(b"first")).await.unwrap();
        store.set("key", Bytes::from_static(b"second")).await.unwrap();

        assert_eq!(
            store.get("key").await.unwrap(),
            Some(Bytes::from_static(b"second"))
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let store = MemoryStore::new();
        store.set("key", Bytes::from_static(b"value")).await.unwrap();

        assert_eq!(
            store.delete("key").await.unwrap(),
            DeleteStatus::Deleted(1)
        );
        assert!(!store.has("key").await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), None);
        assert_eq!(store.delete("key").await.unwrap(), DeleteStatus::Missing);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = MemoryStore::new();
        let clone = store.clone();

        clone.set("key", Bytes::from_static(b"value")).await.unwrap();

        assert!(store.has("key").await.unwrap());
    }
}
