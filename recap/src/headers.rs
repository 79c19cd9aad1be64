//! Shared header plumbing: comma-separated list handling, `Date` parsing,
//! hop-by-hop classification.

use chrono::{DateTime, Utc};
use http::header::{self, HeaderMap, HeaderName};

/// Headers dropped from a response that is rewritten to `304 Not Modified`.
pub(crate) const NOT_MODIFIED_DELETE_HEADERS: [HeaderName; 4] = [
    header::CONTENT_LENGTH,
    header::CONTENT_TYPE,
    header::LAST_MODIFIED,
    // HTTP/2 pseudo-status leftovers observed in the wild.
    HeaderName::from_static("status"),
];

/// Headers that are always hop-by-hop and never merged across responses.
const HOP_BY_HOP_HEADERS: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// All comma-separated tokens across every occurrence of `name`, trimmed,
/// with empty tokens dropped. Multiple header occurrences concatenate.
pub(crate) fn comma_separated_values(headers: &HeaderMap, name: &HeaderName) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// First value of `name` as a string, empty when absent or not valid text.
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Parsed `Date` header of a response, if present and well formed (RFC 1123).
pub(crate) fn response_date(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let value = headers.get(header::DATE)?.to_str().ok()?;
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Response header names that outlive a single connection: everything except
/// the fixed hop-by-hop set and any name listed in `Connection`.
pub(crate) fn end_to_end_headers(headers: &HeaderMap) -> Vec<HeaderName> {
    let connection: Vec<HeaderName> = comma_separated_values(headers, &header::CONNECTION)
        .iter()
        .filter_map(|token| HeaderName::from_bytes(token.as_bytes()).ok())
        .collect();
    headers
        .keys()
        .filter(|name| !HOP_BY_HOP_HEADERS.contains(name) && !connection.contains(name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_separated_values_concatenates_occurrences() {
        let mut headers = HeaderMap::new();
        headers.append(header::VARY, "Accept, Accept-Encoding".parse().unwrap());
        headers.append(header::VARY, " User-Agent ,, ".parse().unwrap());

        assert_eq!(
            comma_separated_values(&headers, &header::VARY),
            vec!["Accept", "Accept-Encoding", "User-Agent"]
        );
    }

    #[test]
    fn response_date_requires_a_parseable_value() {
        let mut headers = HeaderMap::new();
        assert!(response_date(&headers).is_none());

        headers.insert(header::DATE, "not a date".parse().unwrap());
        assert!(response_date(&headers).is_none());

        headers.insert(
            header::DATE,
            "Thu, 01 May 2025 10:00:00 GMT".parse().unwrap(),
        );
        let date = response_date(&headers).unwrap();
        assert_eq!(date.timestamp(), 1_746_093_600);
    }

    #[test]
    fn end_to_end_excludes_hop_by_hop_and_connection_listed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        headers.insert(header::ETAG, "\"x\"".parse().unwrap());
        headers.insert(header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.insert(header::CONNECTION, "close, X-Session-Token".parse().unwrap());
        headers.insert("x-session-token", "abc".parse().unwrap());

        let end_to_end = end_to_end_headers(&headers);

        assert!(end_to_end.contains(&header::CONTENT_TYPE));
        assert!(end_to_end.contains(&header::ETAG));
        assert!(!end_to_end.contains(&header::TRANSFER_ENCODING));
        assert!(!end_to_end.contains(&header::CONNECTION));
        assert!(
            !end_to_end
                .iter()
                .any(|name| name.as_str() == "x-session-token")
        );
    }
}
