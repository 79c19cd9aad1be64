//! Builder for configuring [`MokaStore`].

use std::time::Duration;

use bytes::Bytes;
use moka::future::{Cache, CacheBuilder};

use crate::store::MokaStore;

/// Builder for creating and configuring a [`MokaStore`].
///
/// Use [`MokaStore::builder`] to create a new builder instance.
pub struct MokaStoreBuilder {
    builder: CacheBuilder<String, Bytes, Cache<String, Bytes>>,
}

impl MokaStoreBuilder {
    /// Creates a new builder with the specified capacity in bytes.
    ///
    /// Entries are weighed by blob size; least recently used entries are
    /// evicted once the resident bytes exceed the capacity.
    pub fn new(max_capacity: u64) -> Self {
        MokaStoreBuilder {
            builder: CacheBuilder::new(max_capacity),
        }
    }

    /// Expires entries a fixed duration after they are written.
    ///
    /// Expiry here is a resource bound, not a correctness mechanism — the
    /// cache core revalidates entries on its own schedule regardless.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.builder = self.builder.time_to_live(ttl);
        self
    }

    /// Builds the [`MokaStore`] with the configured settings.
    pub fn build(self) -> MokaStore {
        let cache = self
            .builder
            .weigher(|key: &String, value: &Bytes| {
                (key.len() + value.len()).try_into().unwrap_or(u32::MAX)
            })
            .build();
        MokaStore { cache }
    }
}
