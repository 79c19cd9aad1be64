//! The request-dispatch entry point tying lookup, freshness, revalidation,
//! capture and storage together.

use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HeaderName, RANGE, VARY};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, response};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use recap_store::{MemoryStore, Store};
use tracing::debug;

use crate::body::{CacheBody, CaptureBody, OnComplete};
use crate::cache_control::CacheControl;
use crate::cache_status::{CACHE_STATUS_HEADER, CacheStatus, Lookup, Served, StaleClient, StoreOutcome};
use crate::clock::{Clock, SystemClock};
use crate::entry::StoredResponse;
use crate::freshness::{self, Freshness};
use crate::headers::{NOT_MODIFIED_DELETE_HEADERS, comma_separated_values};
use crate::key::{CacheRange, cache_key};
use crate::policy::{StorePredicate, can_store};
use crate::revalidate::{inject_validators, merge_not_modified};
use crate::upstream::Upstream;
use crate::vary::{varied_header_name, vary_matches};

const GATEWAY_TIMEOUT_INVARIANT: &str = "synthetic 504 response must always build";

/// Request interceptor that serves, revalidates and stores HTTP responses
/// against a pluggable byte [`Store`].
///
/// One value handles any number of concurrent dispatches; the store is the
/// only shared state. Concurrent misses for the same key are not coalesced —
/// both go to the origin and the last write wins.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use recap::CachingTransport;
/// # use recap_store::MemoryStore;
/// # async fn example<U: recap::Upstream<()>>(upstream: U)
/// # where
/// #     U::Error: std::fmt::Debug,
/// #     <U::Body as http_body::Body>::Error: std::fmt::Debug,
/// # {
/// let transport = CachingTransport::new(upstream, Arc::new(MemoryStore::new()));
/// let response = transport
///     .dispatch(http::Request::get("http://example.com/a").body(()).unwrap())
///     .await;
/// # drop(response);
/// # }
/// ```
pub struct CachingTransport<U> {
    upstream: U,
    store: Arc<dyn Store>,
    mark_cache_status: bool,
    predicate: Option<Arc<dyn StorePredicate>>,
    clock: Arc<dyn Clock>,
}

impl<U> CachingTransport<U> {
    /// Creates a transport over `upstream` persisting into `store`, with
    /// diagnostic marking enabled.
    pub fn new(upstream: U, store: Arc<dyn Store>) -> Self {
        CachingTransport {
            upstream,
            store,
            mark_cache_status: true,
            predicate: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a transport backed by a fresh in-memory store.
    pub fn in_memory(upstream: U) -> Self {
        Self::new(upstream, Arc::new(MemoryStore::new()))
    }

    /// Toggles the `X-Proxy-Cache` diagnostic header on returned responses.
    pub fn mark_cache_status(mut self, mark: bool) -> Self {
        self.mark_cache_status = mark;
        self
    }

    /// Installs a caller veto, consulted before the lookup and again before
    /// a store.
    pub fn predicate(mut self, predicate: impl StorePredicate + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Replaces the time source used for freshness decisions.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Dispatches one request, consulting and maintaining the cache.
    ///
    /// A fresh entry is answered as an empty `304 Not Modified` without
    /// touching the origin. A stale entry has its validators attached to the
    /// outgoing request; a `304` from the origin is folded back into the
    /// entry, a `5xx` or transport failure may be masked by the entry under
    /// `stale-if-error`, and anything else replaces or evicts it. Requests
    /// demanding `only-if-cached` with no usable entry get a synthetic
    /// `504 Gateway Timeout`. Transport errors surface unless masked.
    ///
    /// For `GET`, storable responses are written once the caller drains the
    /// body; other cacheable methods are stored before returning.
    pub async fn dispatch<ReqBody>(
        &self,
        request: Request<ReqBody>,
    ) -> Result<Response<CacheBody<U::Body>>, U::Error>
    where
        U: Upstream<ReqBody>,
        // debug bounds
        U::Error: Debug,
        <U::Body as HttpBody>::Error: Debug,
    {
        let (mut req_parts, req_body) = request.into_parts();
        let key = cache_key(&req_parts);
        let mut status = CacheStatus::default();

        let is_get_or_head = req_parts.method == Method::GET || req_parts.method == Method::HEAD;
        let has_range = req_parts
            .headers
            .get(RANGE)
            .is_some_and(|value| !value.as_bytes().is_empty());
        let mut cacheable = is_get_or_head
            && (!has_range || req_parts.extensions.get::<CacheRange>().is_some())
            && self
                .predicate
                .as_ref()
                .is_none_or(|predicate| predicate.allow(&req_parts, None));

        let entry = if cacheable {
            self.read_entry(&key).await
        } else {
            // A write method (or any other non-cacheable request) must not
            // leave a previous entry behind.
            self.invalidate(&key).await;
            None
        };

        let (mut parts, mut body, from_cache) = if let Some(mut cached) = entry {
            status.lookup = Lookup::Cached;
            if vary_matches(cached.headers(), &req_parts.headers) {
                status.freshness =
                    freshness::evaluate(cached.headers(), &req_parts.headers, self.clock.as_ref());
                match status.freshness {
                    Freshness::Fresh => {
                        status.stale_client = StaleClient::UseNone;
                        status.served = Served::Hit;
                        return Ok(self.finish(not_modified_from(cached), status));
                    }
                    Freshness::Stale => {
                        status.stale_client =
                            inject_validators(cached.headers(), &mut req_parts.headers);
                    }
                    Freshness::Transparent => {}
                }
            }

            let outcome = self
                .upstream
                .call(Request::from_parts(req_parts.clone(), req_body))
                .await;

            match outcome {
                Ok(response)
                    if is_get_or_head && response.status() == StatusCode::NOT_MODIFIED =>
                {
                    merge_not_modified(
                        cached.headers_mut(),
                        response.headers(),
                        status.stale_client,
                    );
                    drop(response);
                    if status.stale_client == StaleClient::UseClientHeader {
                        // The caller asked the conditional question; it gets
                        // the conditional answer.
                        *cached.status_mut() = StatusCode::NOT_MODIFIED;
                    }
                    let (parts, body) = cached.into_parts();
                    (parts, ServeBody::Cached(body), true)
                }
                Ok(response)
                    if is_get_or_head
                        && response.status().is_server_error()
                        && freshness::can_stale_on_error(
                            cached.headers(),
                            &req_parts.headers,
                            self.clock.as_ref(),
                        ) =>
                {
                    drop(response);
                    status.served = Served::Hit;
                    let (parts, body) = cached.into_parts();
                    return Ok(self.finish(assemble(parts, ServeBody::Cached(body)), status));
                }
                Err(error)
                    if is_get_or_head
                        && freshness::can_stale_on_error(
                            cached.headers(),
                            &req_parts.headers,
                            self.clock.as_ref(),
                        ) =>
                {
                    debug!(key = %key, ?error, "masking transport failure with stale entry");
                    status.served = Served::Hit;
                    let (parts, body) = cached.into_parts();
                    return Ok(self.finish(assemble(parts, ServeBody::Cached(body)), status));
                }
                Ok(response) => {
                    if response.status() != StatusCode::OK {
                        // Superseded or rejected; the entry is no longer
                        // trustworthy.
                        status.lookup = Lookup::NoCache;
                        self.invalidate(&key).await;
                    }
                    let (parts, body) = response.into_parts();
                    (parts, ServeBody::Upstream(body), false)
                }
                Err(error) => {
                    self.invalidate(&key).await;
                    return Err(error);
                }
            }
        } else {
            let request_cc = CacheControl::parse(&req_parts.headers);
            let (parts, body) = if request_cc.contains("only-if-cached") {
                let (parts, _) = gateway_timeout().into_parts();
                (parts, ServeBody::Cached(Bytes::new()))
            } else {
                let response = self
                    .upstream
                    .call(Request::from_parts(req_parts.clone(), req_body))
                    .await?;
                let (parts, body) = response.into_parts();
                (parts, ServeBody::Upstream(body))
            };
            if let Some(predicate) = self.predicate.as_ref() {
                cacheable = cacheable && predicate.allow(&req_parts, Some(&parts));
            }
            (parts, body, false)
        };

        // Callers that sent their own validators and ended up with a 304 get
        // it in conditional form: stripped headers, empty body.
        if status.stale_client == StaleClient::UseClientHeader
            && parts.status == StatusCode::NOT_MODIFIED
        {
            strip_not_modified_headers(&mut parts.headers);
            body = ServeBody::Cached(Bytes::new());
        }

        let request_cc = CacheControl::parse(&req_parts.headers);
        let response_cc = CacheControl::parse(&parts.headers);
        if cacheable && can_store(&request_cc, &response_cc, &parts.headers) {
            for token in comma_separated_values(&parts.headers, &VARY) {
                if let (Ok(name), Some(varied)) = (
                    HeaderName::from_bytes(token.as_bytes()),
                    varied_header_name(&token),
                ) && let Some(value) = req_parts.headers.get(&name)
                    && !value.as_bytes().is_empty()
                {
                    parts.headers.insert(varied, value.clone());
                }
            }
            if status.stale_client == StaleClient::UseClientHeader
                && parts.status == StatusCode::NOT_MODIFIED
            {
                status.served = served_from(from_cache);
                return Ok(self.finish(assemble(parts, body), status));
            }
            if !from_cache {
                status.store = StoreOutcome::Store;
                match body {
                    ServeBody::Upstream(inner) if req_parts.method == Method::GET => {
                        // Delay the write until the caller drains the body.
                        let on_complete = self.capture_commit(key.clone(), &parts);
                        let response = Response::from_parts(
                            parts,
                            CacheBody::Capture(CaptureBody::new(inner, on_complete)),
                        );
                        return Ok(self.finish(response, status));
                    }
                    ServeBody::Upstream(inner) => {
                        // HEAD carries no streamable payload; store in place.
                        match inner.collect().await {
                            Ok(collected) => {
                                let bytes = collected.to_bytes();
                                self.write_entry(&key, &parts, bytes.clone()).await;
                                body = ServeBody::Cached(bytes);
                            }
                            Err(error) => {
                                debug!(key = %key, ?error, "body collection failed; entry not stored");
                                body = ServeBody::Cached(Bytes::new());
                            }
                        }
                    }
                    ServeBody::Cached(ref bytes) => {
                        self.write_entry(&key, &parts, bytes.clone()).await;
                    }
                }
            }
        } else {
            status.lookup = Lookup::NoCache;
            self.invalidate(&key).await;
        }

        status.served = served_from(from_cache);
        Ok(self.finish(assemble(parts, body), status))
    }

    fn finish<B>(
        &self,
        mut response: Response<CacheBody<B>>,
        status: CacheStatus,
    ) -> Response<CacheBody<B>> {
        if self.mark_cache_status {
            response
                .headers_mut()
                .insert(CACHE_STATUS_HEADER, status.header_value());
        }
        response
    }

    fn capture_commit(&self, key: String, parts: &response::Parts) -> OnComplete {
        let store = Arc::clone(&self.store);
        let status = parts.status;
        let version = parts.version;
        let headers = parts.headers.clone();
        Box::new(move |body: Bytes| {
            let entry = StoredResponse::new(status, version, headers, body);
            Box::pin(async move {
                match entry.encode() {
                    Ok(raw) => {
                        if let Err(error) = store.set(&key, raw).await {
                            debug!(key = %key, %error, "cache write failed");
                        }
                    }
                    Err(error) => debug!(key = %key, %error, "cache entry encoding failed"),
                }
            })
        })
    }

    async fn write_entry(&self, key: &str, parts: &response::Parts, body: Bytes) {
        let entry = StoredResponse::new(parts.status, parts.version, parts.headers.clone(), body);
        match entry.encode() {
            Ok(raw) => {
                if let Err(error) = self.store.set(key, raw).await {
                    debug!(key, %error, "cache write failed");
                }
            }
            Err(error) => debug!(key, %error, "cache entry encoding failed"),
        }
    }

    async fn read_entry(&self, key: &str) -> Option<Response<Bytes>> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                debug!(key, %error, "cache read failed");
                return None;
            }
        };
        match StoredResponse::decode(&raw) {
            Ok(entry) => Some(entry.into_response()),
            Err(error) => {
                // A blob that no longer decodes is as good as absent.
                debug!(key, %error, "discarding malformed cache entry");
                None
            }
        }
    }

    async fn invalidate(&self, key: &str) {
        if let Err(error) = self.store.delete(key).await {
            debug!(key, %error, "cache delete failed");
        }
    }
}

/// Body of a response while the dispatch is still deciding how to return it.
enum ServeBody<B> {
    Cached(Bytes),
    Upstream(B),
}

fn assemble<B>(parts: response::Parts, body: ServeBody<B>) -> Response<CacheBody<B>> {
    let body = match body {
        ServeBody::Cached(bytes) => CacheBody::full(bytes),
        ServeBody::Upstream(inner) => CacheBody::Upstream(inner),
    };
    Response::from_parts(parts, body)
}

fn served_from(from_cache: bool) -> Served {
    if from_cache { Served::Hit } else { Served::Miss }
}

/// Rewrites a fresh entry into the empty `304 Not Modified` served to the
/// caller.
fn not_modified_from<B>(mut cached: Response<Bytes>) -> Response<CacheBody<B>> {
    *cached.status_mut() = StatusCode::NOT_MODIFIED;
    strip_not_modified_headers(cached.headers_mut());
    let (parts, _) = cached.into_parts();
    Response::from_parts(parts, CacheBody::Full(None))
}

fn strip_not_modified_headers(headers: &mut HeaderMap) {
    for name in &NOT_MODIFIED_DELETE_HEADERS {
        headers.remove(name);
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
}

fn gateway_timeout() -> Response<()> {
    Response::builder()
        .status(StatusCode::GATEWAY_TIMEOUT)
        .body(())
        .expect(GATEWAY_TIMEOUT_INVARIANT)
}
