use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use recap_store::{DeleteStatus, Store, StoreResult};

use crate::builder::MokaStoreBuilder;

/// Bounded in-memory [`Store`] backed by a moka cache.
///
/// Entries are weighed by their blob size, so the configured capacity bounds
/// memory rather than entry count.
#[derive(Clone)]
pub struct MokaStore {
    pub(crate) cache: Cache<String, Bytes>,
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl MokaStore {
    /// Creates a builder with the given capacity in bytes.
    pub fn builder(max_capacity: u64) -> MokaStoreBuilder {
        MokaStoreBuilder::new(max_capacity)
    }
}

#[async_trait]
impl Store for MokaStore {
    async fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.cache.insert(key.to_owned(), value).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }
}
