use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::StoreError;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a delete operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteStatus {
    /// Number of deleted entries.
    Deleted(u32),
    /// The key was not present.
    Missing,
}

/// A byte blob store keyed by string.
///
/// Backends promise atomic per-key replacement and safe concurrent access
/// across distinct keys; concurrent writes to one key resolve last-write-wins.
/// Nothing beyond that — no cross-key consistency, no ordering.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns whether `key` currently has a value.
    async fn has(&self, key: &str) -> StoreResult<bool>;

    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Bytes) -> StoreResult<()>;

    /// Removes the value stored under `key`.
    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus>;
}

#[async_trait]
impl Store for &dyn Store {
    async fn has(&self, key: &str) -> StoreResult<bool> {
        (*self).has(key).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        (*self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> StoreResult<()> {
        (*self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus> {
        (*self).delete(key).await
    }
}

#[async_trait]
impl Store for Box<dyn Store> {
    async fn has(&self, key: &str) -> StoreResult<bool> {
        (**self).has(key).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> StoreResult<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus> {
        (**self).delete(key).await
    }
}

#[async_trait]
impl Store for Arc<dyn Store> {
    async fn has(&self, key: &str) -> StoreResult<bool> {
        (**self).has(key).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Bytes) -> StoreResult<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteStatus> {
        (**self).delete(key).await
    }
}
