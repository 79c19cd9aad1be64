#![warn(missing_docs)]
//! # recap-reqwest
//!
//! [`reqwest`] integration for the `recap` HTTP cache.
//!
//! [`ReqwestUpstream`] bridges a [`reqwest::Client`] to recap's
//! [`Upstream`] seam so a [`CachingTransport`](recap::CachingTransport) can
//! front a real HTTP client:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use recap::CachingTransport;
//! use recap_reqwest::ReqwestUpstream;
//!
//! # async fn example() -> Result<(), reqwest::Error> {
//! let transport = CachingTransport::in_memory(ReqwestUpstream::new(reqwest::Client::new()));
//! let response = transport
//!     .dispatch(
//!         http::Request::get("http://example.com/a")
//!             .body(reqwest::Body::from(""))
//!             .unwrap(),
//!     )
//!     .await?;
//! # drop(response);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use http::{Request, Response};
use recap::Upstream;

/// [`Upstream`] implementation dispatching through a [`reqwest::Client`].
///
/// Cloning shares the underlying client and its connection pool.
#[derive(Clone, Debug, Default)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    /// Wraps a client.
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestUpstream { client }
    }
}

#[async_trait]
impl Upstream<reqwest::Body> for ReqwestUpstream {
    type Body = reqwest::Body;
    type Error = reqwest::Error;

    async fn call(
        &self,
        request: Request<reqwest::Body>,
    ) -> Result<Response<reqwest::Body>, reqwest::Error> {
        let request: reqwest::Request = request.try_into()?;
        let response = self.client.execute(request).await?;
        Ok(response.into())
    }
}
