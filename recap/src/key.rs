//! Cache key derivation.

use http::{Method, header, request};

/// Per-request opt-in for caching range responses.
///
/// Insert into the request's [`Extensions`](http::Extensions) to make the
/// literal `Range` header participate in the cache key and permit caching of
/// the ranged response. Without it, a request carrying `Range` is not
/// cacheable at all.
///
/// ```
/// use http::Request;
/// use recap::CacheRange;
///
/// let mut request = Request::get("http://example.com/blob")
///     .header("Range", "bytes=0-1023")
///     .body(())
///     .unwrap();
/// request.extensions_mut().insert(CacheRange);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheRange;

/// Computes the cache key for a request.
///
/// `GET` requests key on the full URL alone; any other method prefixes the
/// key with the method name. With the [`CacheRange`] opt-in present, the
/// literal `Range` value is appended behind a `-` separator.
pub fn cache_key(parts: &request::Parts) -> String {
    let mut key = if parts.method == Method::GET {
        parts.uri.to_string()
    } else {
        format!("{} {}", parts.method, parts.uri)
    };
    if parts.extensions.get::<CacheRange>().is_some() {
        let range = parts
            .headers
            .get(header::RANGE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        key.push('-');
        key.push_str(range);
    }
    key
}

#[cfg(test)]
mod tests {
    use http::Request;

    use super::*;

    fn parts(request: Request<()>) -> request::Parts {
        request.into_parts().0
    }

    #[test]
    fn get_keys_on_url_alone() {
        let request = Request::get("http://example.com/a?q=1").body(()).unwrap();

        assert_eq!(cache_key(&parts(request)), "http://example.com/a?q=1");
    }

    #[test]
    fn other_methods_prefix_the_method() {
        let head = Request::head("http://example.com/a").body(()).unwrap();
        let post = Request::post("http://example.com/a").body(()).unwrap();

        assert_eq!(cache_key(&parts(head)), "HEAD http://example.com/a");
        assert_eq!(cache_key(&parts(post)), "POST http://example.com/a");
    }

    #[test]
    fn equal_requests_compute_equal_keys() {
        let first = Request::get("http://example.com/a").body(()).unwrap();
        let second = Request::get("http://example.com/a").body(()).unwrap();

        assert_eq!(cache_key(&parts(first)), cache_key(&parts(second)));
    }

    #[test]
    fn range_is_ignored_without_the_opt_in() {
        let plain = Request::get("http://example.com/a").body(()).unwrap();
        let ranged = Request::get("http://example.com/a")
            .header("Range", "bytes=0-99")
            .body(())
            .unwrap();

        assert_eq!(cache_key(&parts(plain)), cache_key(&parts(ranged)));
    }

    #[test]
    fn opted_in_range_participates_in_the_key() {
        let mut ranged = Request::get("http://example.com/a")
            .header("Range", "bytes=0-99")
            .body(())
            .unwrap();
        ranged.extensions_mut().insert(CacheRange);

        assert_eq!(
            cache_key(&parts(ranged)),
            "http://example.com/a-bytes=0-99"
        );
    }

    #[test]
    fn opt_in_without_range_still_marks_the_key() {
        let mut request = Request::get("http://example.com/a").body(()).unwrap();
        request.extensions_mut().insert(CacheRange);

        assert_eq!(cache_key(&parts(request)), "http://example.com/a-");
    }
}
