//! `Vary` matching against stored request-header bookkeeping.

use http::HeaderMap;
use http::header::{HeaderName, VARY};

use crate::headers::comma_separated_values;

/// Prefix of the bookkeeping headers recording, per `Vary` token, the
/// request header value observed when the entry was stored.
pub(crate) const VARIED_HEADER_PREFIX: &str = "x-varied-";

/// Bookkeeping header name for one `Vary` token.
pub(crate) fn varied_header_name(token: &str) -> Option<HeaderName> {
    HeaderName::from_bytes(format!("{VARIED_HEADER_PREFIX}{token}").as_bytes()).ok()
}

/// Whether a cached entry still applies to a request under the entry's
/// `Vary` headers.
///
/// Every token listed across all `Vary` occurrences must match: the
/// request's value for that header equals the value recorded at store time,
/// with "absent" and "empty" treated alike. No tokens means a trivial match.
pub fn vary_matches(entry: &HeaderMap, request: &HeaderMap) -> bool {
    comma_separated_values(entry, &VARY).iter().all(|token| {
        match (
            HeaderName::from_bytes(token.as_bytes()),
            varied_header_name(token),
        ) {
            (Ok(name), Some(varied)) => {
                request.get(&name).map(|value| value.as_bytes()).unwrap_or_default()
                    == entry.get(&varied).map(|value| value.as_bytes()).unwrap_or_default()
            }
            // A token that is not a legal header name can never have been
            // recorded either; both sides read as empty.
            _ => true,
        }
    })
}
