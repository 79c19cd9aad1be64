//! Conditional-request construction and `304 Not Modified` reconciliation.

use http::HeaderMap;
use http::header::{CONTENT_LENGTH, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};

use crate::cache_status::StaleClient;
use crate::headers::end_to_end_headers;

/// Copies the cached entry's validators onto the outgoing request so the
/// origin can answer `304 Not Modified`.
///
/// Validators the caller sent itself are overwritten; the returned owner
/// records whether the conditional exchange now belongs to the cache, so a
/// later `304` is routed back into the entry instead of to the caller.
pub(crate) fn inject_validators(entry: &HeaderMap, request: &mut HeaderMap) -> StaleClient {
    let mut stale_client = StaleClient::UseClientHeader;
    if let Some(etag) = entry.get(ETAG).filter(|value| !value.as_bytes().is_empty()) {
        request.insert(IF_NONE_MATCH, etag.clone());
        stale_client = StaleClient::UseCacheHeader;
    }
    if let Some(last_modified) = entry
        .get(LAST_MODIFIED)
        .filter(|value| !value.as_bytes().is_empty())
    {
        request.insert(IF_MODIFIED_SINCE, last_modified.clone());
        stale_client = StaleClient::UseCacheHeader;
    }
    stale_client
}

/// Folds the end-to-end headers of a `304 Not Modified` into the cached
/// entry, replacing same-named value lists wholesale.
///
/// `Content-Length` is left alone when the cache injected the validators:
/// the origin's length would describe a body it never sent.
pub(crate) fn merge_not_modified(
    entry: &mut HeaderMap,
    not_modified: &HeaderMap,
    stale_client: StaleClient,
) {
    for name in end_to_end_headers(not_modified) {
        if stale_client == StaleClient::UseCacheHeader && name == CONTENT_LENGTH {
            continue;
        }
        entry.remove(&name);
        for value in not_modified.get_all(&name) {
            entry.append(name.clone(), value.clone());
        }
    }
}
