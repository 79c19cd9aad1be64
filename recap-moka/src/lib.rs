#![warn(missing_docs)]
//! # recap-moka
//!
//! Bounded in-memory [`Store`](recap_store::Store) backend for the `recap`
//! HTTP cache, built on [`moka`](https://docs.rs/moka).
//!
//! Unlike the unbounded `MemoryStore`, this backend evicts least recently
//! used entries past a configured capacity and can expire entries after a
//! fixed time to live.
//!
//! ```
//! use recap_moka::MokaStore;
//!
//! let store = MokaStore::builder(10_000).build();
//! ```

mod builder;
mod store;

pub use builder::MokaStoreBuilder;
pub use store::MokaStore;
