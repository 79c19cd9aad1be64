//! Freshness classification of cached responses.

use chrono::{DateTime, Duration, Utc};
use http::HeaderMap;
use http::header::{ETAG, EXPIRES, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};

use crate::cache_control::CacheControl;
use crate::clock::Clock;
use crate::headers::{header_str, response_date};

/// Verdict on whether a cached response may serve a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Freshness {
    /// The entry may be returned without contacting the origin.
    Fresh,
    /// The entry needs revalidation before reuse.
    Stale,
    /// The entry must not be used; the request is forwarded untouched.
    Transparent,
}

impl Freshness {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::Transparent => "transparent",
        }
    }
}

/// Classifies a cached response against a new request.
///
/// A pure function of the two header sets and the clock. This is a private
/// cache, so `public`, `private` and `s-maxage` carry no weight here.
///
/// The request's directives tighten or loosen the response's lifetime:
/// `max-age` overrides it, `min-fresh` demands extra headroom, `max-stale`
/// grants extra slack (valueless: unconditionally). A response without a
/// parseable `Date` can never be fresh. Within the lifetime, client
/// validators must converge with the entry's, otherwise the origin gets to
/// arbitrate.
pub fn evaluate(response: &HeaderMap, request: &HeaderMap, clock: &dyn Clock) -> Freshness {
    let response_cc = CacheControl::parse(response);
    let request_cc = CacheControl::parse(request);

    if request_cc.contains("no-cache") {
        return Freshness::Transparent;
    }
    if response_cc.contains("no-cache") {
        return Freshness::Stale;
    }
    if request_cc.contains("only-if-cached") {
        return Freshness::Fresh;
    }

    let Some(date) = response_date(response) else {
        return Freshness::Stale;
    };
    let mut current_age = clock.since(date);

    // max-age overrides Expires even when Expires is more restrictive.
    let mut lifetime = if response_cc.contains("max-age") {
        response_cc
            .seconds("max-age")
            .map(Duration::seconds)
            .unwrap_or_else(Duration::zero)
    } else {
        expires_lifetime(response, date)
    };

    if request_cc.contains("max-age") {
        // The client accepts no response older than this.
        lifetime = request_cc
            .seconds("max-age")
            .map(Duration::seconds)
            .unwrap_or_else(Duration::zero);
    }
    if let Some(min_fresh) = request_cc.seconds("min-fresh") {
        // The client wants the response to stay fresh for this much longer.
        current_age = current_age + Duration::seconds(min_fresh);
    }
    if let Some(max_stale) = request_cc.get("max-stale") {
        // Valueless max-stale accepts a stale response of any age.
        if max_stale.is_empty() {
            return Freshness::Fresh;
        }
        if let Some(seconds) = request_cc.seconds("max-stale") {
            current_age = current_age - Duration::seconds(seconds);
        }
    }

    if lifetime > current_age {
        let if_none_match = header_str(request, &IF_NONE_MATCH);
        let etag = header_str(response, &ETAG);
        let if_modified_since = header_str(request, &IF_MODIFIED_SINCE);
        let last_modified = header_str(response, &LAST_MODIFIED);

        // An unconditional request within the lifetime is simply fresh.
        if if_none_match.is_empty() && if_modified_since.is_empty() {
            return Freshness::Fresh;
        }

        // Conditional requests are fresh only when the client's validators
        // converge with the entry's; a divergent conditional goes to the
        // origin for arbitration.
        let etag_match = !if_none_match.is_empty() && if_none_match == etag;
        let date_match = !if_modified_since.is_empty() && if_modified_since == last_modified;
        if (etag_match && date_match)
            || (etag_match && (if_modified_since.is_empty() || last_modified.is_empty()))
            || (date_match && (if_none_match.is_empty() || etag.is_empty()))
        {
            return Freshness::Fresh;
        }
    }

    Freshness::Stale
}

fn expires_lifetime(response: &HeaderMap, date: DateTime<Utc>) -> Duration {
    match header_str(response, &EXPIRES) {
        "" => Duration::zero(),
        expires => DateTime::parse_from_rfc2822(expires)
            .map(|expires| expires.with_timezone(&Utc) - date)
            .unwrap_or_else(|_| Duration::zero()),
    }
}

/// Whether a stale entry may stand in for an origin failure, per the
/// `stale-if-error` extension (RFC 5861).
///
/// The directive is honored from either side; a request directive overrides
/// the response's window. A valueless directive applies unconditionally, a
/// valued one only while the entry's age stays inside the window, and a
/// malformed value disables the extension outright.
pub fn can_stale_on_error(response: &HeaderMap, request: &HeaderMap, clock: &dyn Clock) -> bool {
    let response_cc = CacheControl::parse(response);
    let request_cc = CacheControl::parse(request);

    let mut window = None;
    for cc in [&response_cc, &request_cc] {
        if let Some(value) = cc.get("stale-if-error") {
            if value.is_empty() {
                return true;
            }
            match cc.seconds("stale-if-error") {
                Some(seconds) => window = Some(Duration::seconds(seconds)),
                None => return false,
            }
        }
    }

    if let Some(window) = window
        && window >= Duration::zero()
        && let Some(date) = response_date(response)
    {
        return window > clock.since(date);
    }
    false
}
