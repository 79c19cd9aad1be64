//! Response bodies returned by the interceptor.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::ready;
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;

/// Continuation invoked with the fully buffered body once the wrapped
/// stream reaches end-of-stream.
pub(crate) type OnComplete = Box<dyn FnOnce(Bytes) -> BoxFuture<'static, ()> + Send>;

/// Body of a response returned by the interceptor.
///
/// `Full` serves buffered bytes (a cached entry, or nothing at all for
/// synthesized `304`/`504` responses), `Upstream` forwards the origin stream
/// untouched, and `Capture` forwards the origin stream while copying it into
/// the store.
#[pin_project(project = CacheBodyProj)]
pub enum CacheBody<B> {
    /// Buffered bytes, yielded once. `None` is an empty body.
    Full(Option<Bytes>),
    /// The origin body, forwarded as-is.
    Upstream(#[pin] B),
    /// The origin body, teed into the store as the caller reads it.
    Capture(#[pin] CaptureBody<B>),
}

impl<B> CacheBody<B> {
    pub(crate) fn full(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            CacheBody::Full(None)
        } else {
            CacheBody::Full(Some(bytes))
        }
    }
}

impl<B> HttpBody for CacheBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            CacheBodyProj::Full(data) => {
                Poll::Ready(data.take().map(|bytes| Ok(Frame::data(bytes))))
            }
            CacheBodyProj::Upstream(body) => match ready!(body.poll_frame(cx)) {
                Some(Ok(frame)) => Poll::Ready(Some(Ok(
                    frame.map_data(|mut data| data.copy_to_bytes(data.remaining()))
                ))),
                Some(Err(error)) => Poll::Ready(Some(Err(error))),
                None => Poll::Ready(None),
            },
            CacheBodyProj::Capture(capture) => capture.poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            CacheBody::Full(data) => data.is_none(),
            CacheBody::Upstream(body) => body.is_end_stream(),
            CacheBody::Capture(capture) => capture.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            CacheBody::Full(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            CacheBody::Full(None) => SizeHint::with_exact(0),
            CacheBody::Upstream(body) => body.size_hint(),
            CacheBody::Capture(capture) => capture.size_hint(),
        }
    }
}

impl<B> fmt::Debug for CacheBody<B>
where
    B: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBody::Full(Some(bytes)) => f
                .debug_tuple("Full")
                .field(&format!("{} bytes", bytes.len()))
                .finish(),
            CacheBody::Full(None) => f.debug_tuple("Full").field(&"empty").finish(),
            CacheBody::Upstream(_) => f.debug_tuple("Upstream").field(&"...").finish(),
            CacheBody::Capture(_) => f.debug_tuple("Capture").field(&"...").finish(),
        }
    }
}

/// Tees a body into an internal buffer and hands the buffered bytes to the
/// completion continuation exactly once, on the poll that observes
/// end-of-stream.
///
/// The caller sees every byte unchanged. The final end-of-stream is withheld
/// until the continuation's future finishes, so a fully drained body implies
/// the store write has completed. Dropping the body before end-of-stream
/// discards the capture without invoking the continuation, and a stream
/// error does the same.
#[pin_project]
pub struct CaptureBody<B> {
    #[pin]
    inner: B,
    buffer: BytesMut,
    on_complete: Option<OnComplete>,
    committing: Option<BoxFuture<'static, ()>>,
    finished: bool,
}

impl<B> CaptureBody<B> {
    pub(crate) fn new(inner: B, on_complete: OnComplete) -> Self {
        CaptureBody {
            inner,
            buffer: BytesMut::new(),
            on_complete: Some(on_complete),
            committing: None,
            finished: false,
        }
    }
}

impl<B> HttpBody for CaptureBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();

        loop {
            if let Some(commit) = this.committing.as_mut() {
                ready!(commit.as_mut().poll(cx));
                *this.committing = None;
                *this.finished = true;
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.inner.as_mut().poll_frame(cx)) {
                Some(Ok(frame)) => {
                    let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                    if let Some(data) = frame.data_ref() {
                        this.buffer.extend_from_slice(data);
                    }
                    return Poll::Ready(Some(Ok(frame)));
                }
                Some(Err(error)) => {
                    // A broken stream never reaches the store.
                    *this.on_complete = None;
                    *this.finished = true;
                    return Poll::Ready(Some(Err(error)));
                }
                None => match this.on_complete.take() {
                    Some(on_complete) => {
                        let body = std::mem::take(this.buffer).freeze();
                        *this.committing = Some(on_complete(body));
                    }
                    None => {
                        *this.finished = true;
                        return Poll::Ready(None);
                    }
                },
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finished
    }

    fn size_hint(&self) -> SizeHint {
        if self.finished {
            SizeHint::with_exact(0)
        } else {
            self.inner.size_hint()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::stream;
    use http_body_util::{BodyExt, Full, StreamBody};
    use tokio::sync::Mutex;

    use super::*;

    fn recording_on_complete(
        invocations: Arc<AtomicUsize>,
        captured: Arc<Mutex<Option<Bytes>>>,
    ) -> OnComplete {
        Box::new(move |body| {
            Box::pin(async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                *captured.lock().await = Some(body);
            })
        })
    }

    #[tokio::test]
    async fn capture_commits_full_body_once_on_drain() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let captured = Arc::new(Mutex::new(None));

        let stream = stream::iter(vec![
            Ok::<_, Infallible>(Frame::data(Bytes::from("chunk1"))),
            Ok::<_, Infallible>(Frame::data(Bytes::from("chunk2"))),
        ]);
        let mut body = CaptureBody::new(
            StreamBody::new(stream),
            recording_on_complete(invocations.clone(), captured.clone()),
        );

        let mut seen = BytesMut::new();
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame.unwrap().into_data() {
                seen.extend_from_slice(&data);
            }
        }

        // Bytes reach the caller unchanged and the commit fired exactly once.
        assert_eq!(seen.freeze(), Bytes::from("chunk1chunk2"));
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(
            captured.lock().await.clone(),
            Some(Bytes::from("chunk1chunk2"))
        );

        // Polling past the end never re-commits.
        assert!(body.frame().await.is_none());
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn capture_commits_empty_body() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let captured = Arc::new(Mutex::new(None));

        let mut body = CaptureBody::new(
            Full::new(Bytes::new()),
            recording_on_complete(invocations.clone(), captured.clone()),
        );

        while body.frame().await.is_some() {}

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert_eq!(captured.lock().await.clone(), Some(Bytes::new()));
    }

    #[tokio::test]
    async fn dropping_before_end_of_stream_discards_the_capture() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let captured = Arc::new(Mutex::new(None));

        let stream = stream::iter(vec![
            Ok::<_, Infallible>(Frame::data(Bytes::from("chunk1"))),
            Ok::<_, Infallible>(Frame::data(Bytes::from("chunk2"))),
        ]);
        let mut body = CaptureBody::new(
            StreamBody::new(stream),
            recording_on_complete(invocations.clone(), captured.clone()),
        );

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from("chunk1"));
        drop(body);

        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stream_error_discards_the_capture() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let captured = Arc::new(Mutex::new(None));

        let stream = stream::iter(vec![
            Ok(Frame::data(Bytes::from("chunk1"))),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let mut body = CaptureBody::new(
            StreamBody::new(stream),
            recording_on_complete(invocations.clone(), captured.clone()),
        );

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from("chunk1"));
        assert!(body.frame().await.unwrap().is_err());
        assert!(body.frame().await.is_none());

        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn full_yields_bytes_once() {
        let mut body: CacheBody<Full<Bytes>> = CacheBody::full(Bytes::from("hello"));

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from("hello"));
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn empty_full_is_end_of_stream() {
        let body: CacheBody<Full<Bytes>> = CacheBody::full(Bytes::new());

        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));
    }

    #[tokio::test]
    async fn upstream_passes_through() {
        let mut body = CacheBody::Upstream(Full::new(Bytes::from("origin")));

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from("origin"));
        assert!(body.frame().await.is_none());
    }
}
