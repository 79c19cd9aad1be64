//! Composite cache diagnostics attached to returned responses.

use std::fmt;

use http::{HeaderName, HeaderValue};

use crate::freshness::Freshness;

/// Header carrying the composite cache diagnostic for a dispatch.
///
/// The value is a comma-separated quintuple, e.g.
/// `hit, cached, fresh, no-store, use-none`.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-proxy-cache");

const STATUS_VALUE_INVARIANT: &str = "cache status values are always valid header text";

/// Whether the returned response was served out of the cache.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Served {
    /// The response came from the origin (or was synthesized).
    Miss,
    /// The response is the stored entry.
    Hit,
}

impl Served {
    fn as_str(self) -> &'static str {
        match self {
            Served::Miss => "miss",
            Served::Hit => "hit",
        }
    }
}

/// Whether the stored-entry lookup produced a usable entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lookup {
    /// No usable entry, or the entry was discarded during the dispatch.
    NoCache,
    /// A stored entry was found for the key.
    Cached,
}

impl Lookup {
    fn as_str(self) -> &'static str {
        match self {
            Lookup::NoCache => "no-cache",
            Lookup::Cached => "cached",
        }
    }
}

/// Whether this dispatch arranged a store of the response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreOutcome {
    /// Nothing written for this dispatch.
    NoStore,
    /// The response is being written (for `GET`, once the body drains).
    Store,
}

impl StoreOutcome {
    fn as_str(self) -> &'static str {
        match self {
            StoreOutcome::NoStore => "no-store",
            StoreOutcome::Store => "store",
        }
    }
}

/// Whose validators drove the conditional exchange, if any.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StaleClient {
    /// No conditional exchange took place; the entry was served fresh.
    UseNone,
    /// The cache injected the stored entry's validators.
    UseCacheHeader,
    /// The caller's own conditional headers were forwarded untouched.
    UseClientHeader,
}

impl StaleClient {
    fn as_str(self) -> &'static str {
        match self {
            StaleClient::UseNone => "use-none",
            StaleClient::UseCacheHeader => "use-cache-header",
            StaleClient::UseClientHeader => "use-client-header",
        }
    }
}

/// Composite diagnostic recorded while a dispatch runs and attached as
/// [`CACHE_STATUS_HEADER`] when marking is enabled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheStatus {
    /// Where the returned response came from.
    pub served: Served,
    /// Outcome of the stored-entry lookup.
    pub lookup: Lookup,
    /// Freshness verdict for this dispatch.
    pub freshness: Freshness,
    /// Whether a store was arranged.
    pub store: StoreOutcome,
    /// Who owned the conditional exchange.
    pub stale_client: StaleClient,
}

impl Default for CacheStatus {
    fn default() -> Self {
        CacheStatus {
            served: Served::Miss,
            lookup: Lookup::NoCache,
            freshness: Freshness::Transparent,
            store: StoreOutcome::NoStore,
            stale_client: StaleClient::UseClientHeader,
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.served.as_str(),
            self.lookup.as_str(),
            self.freshness.as_str(),
            self.store.as_str(),
            self.stale_client.as_str(),
        )
    }
}

impl CacheStatus {
    /// Renders the quintuple as a header value.
    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&self.to_string()).expect(STATUS_VALUE_INVARIANT)
    }
}
