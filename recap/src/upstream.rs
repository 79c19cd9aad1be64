//! The transport seam underneath the cache.

use async_trait::async_trait;
use http::{Request, Response};
use http_body::Body as HttpBody;

/// The transport the interceptor delegates actual network I/O to.
///
/// Anything that can turn a request into a response can sit below the
/// cache: a real HTTP client (`recap-reqwest`), another middleware stack,
/// or a scripted mock in tests. Errors pass through the interceptor
/// untouched unless a stale entry is allowed to stand in for them.
#[async_trait]
pub trait Upstream<ReqBody>: Send + Sync {
    /// Response body type produced by this transport.
    type Body: HttpBody;
    /// Transport-level error type, surfaced to the caller.
    type Error;

    /// Dispatches one request to the origin.
    async fn call(&self, request: Request<ReqBody>) -> Result<Response<Self::Body>, Self::Error>;
}
