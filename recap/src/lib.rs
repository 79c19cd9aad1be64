#![warn(missing_docs)]
//! # recap
//!
//! A private HTTP response cache implemented as a request-transport
//! interceptor.
//!
//! [`CachingTransport`] sits between an HTTP client and the network. On each
//! dispatch it may serve a stored response outright, revalidate a stale one
//! with conditional headers, or forward the request untouched; origin
//! responses that pass the storability rules are captured as they stream and
//! written back to a pluggable byte store.
//!
//! This is a *private* cache, meant for a single user agent or API client:
//! directives that only matter to shared caches (`public`, `s-maxage`) are
//! ignored.
//!
//! ## Pieces
//!
//! - [`CachingTransport`] — the dispatch entry point, generic over an
//!   [`Upstream`] transport and a [`Store`](recap_store::Store) backend.
//! - [`Freshness`] and [`freshness::evaluate`] — the fresh/stale/transparent
//!   verdict driving reuse and revalidation.
//! - [`CacheBody`] — the response body returned to callers: cached bytes,
//!   a passthrough stream, or a stream being captured into the store.
//! - [`CacheStatus`] — the composite diagnostic attached as
//!   [`CACHE_STATUS_HEADER`] on every returned response.
//! - [`CacheRange`] — per-request opt-in for caching range responses.

pub mod body;
pub mod cache_control;
pub mod cache_status;
pub mod clock;
pub mod entry;
pub mod freshness;
mod headers;
pub mod key;
pub mod policy;
mod revalidate;
mod transport;
mod upstream;
pub mod vary;

pub use body::{CacheBody, CaptureBody};
pub use cache_control::CacheControl;
pub use cache_status::{CACHE_STATUS_HEADER, CacheStatus};
pub use clock::{Clock, SystemClock};
pub use entry::{EntryError, StoredResponse};
pub use freshness::Freshness;
pub use key::{CacheRange, cache_key};
pub use policy::StorePredicate;
pub use transport::CachingTransport;
pub use upstream::Upstream;
