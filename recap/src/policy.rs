//! Storability rules and the caller-supplied veto.

use http::HeaderMap;
use http::header::{ETAG, LAST_MODIFIED};
use http::{request, response};

use crate::cache_control::CacheControl;

/// Caller veto over which exchanges may use the cache.
///
/// Consulted twice per dispatch: once before the lookup with only the
/// request available, and again before arranging a store with the response
/// at hand. Returning `false` at either point keeps the exchange out of the
/// cache; it never affects how the request is forwarded.
///
/// Any `Fn(&request::Parts, Option<&response::Parts>) -> bool` qualifies.
pub trait StorePredicate: Send + Sync {
    /// Returns whether the exchange may be cached.
    fn allow(&self, request: &request::Parts, response: Option<&response::Parts>) -> bool;
}

impl<F> StorePredicate for F
where
    F: Fn(&request::Parts, Option<&response::Parts>) -> bool + Send + Sync,
{
    fn allow(&self, request: &request::Parts, response: Option<&response::Parts>) -> bool {
        self(request, response)
    }
}

/// Whether a response may be written to the store at all.
///
/// Refused when either side declared `no-store`, or when the response
/// carries neither a non-empty `ETag` nor a non-empty `Last-Modified` —
/// without a validator there is no way to revalidate the entry later.
pub(crate) fn can_store(
    request_cc: &CacheControl,
    response_cc: &CacheControl,
    response: &HeaderMap,
) -> bool {
    if response_cc.contains("no-store") || request_cc.contains("no-store") {
        return false;
    }
    let has_validator = |name| {
        response
            .get(name)
            .is_some_and(|value: &http::HeaderValue| !value.as_bytes().is_empty())
    };
    has_validator(ETAG) || has_validator(LAST_MODIFIED)
}
