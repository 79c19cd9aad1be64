#![warn(missing_docs)]
//! # recap-store
//!
//! Storage abstraction for the `recap` HTTP cache.
//!
//! The cache core never interprets what a backend keeps: entries are opaque
//! byte blobs under string keys. Anything that can implement the four
//! operations of [`Store`] can sit behind the cache — the in-memory
//! [`MemoryStore`] shipped here, the bounded `recap-moka` backend, or an
//! external key/value service.

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{DeleteStatus, Store, StoreResult};
