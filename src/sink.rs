//! Push-style response sinks and the compressing decorator.
//!
//! A [`ResponseSink`] is where a producer writes response bytes. Stages wrap the sink they
//! receive in a [`CompressedSink`], so writes meant for the wrapped sink go through a
//! compressor first while headers and status stay shared with it.

use crate::codec::Codec;
use crate::transform::Transform;
use bytes::{Buf, Bytes};
use http::{HeaderMap, StatusCode};
use std::future::poll_fn;
use std::io;
use std::task::{Context, Poll, ready};

/// The capabilities a response exposes to body producers.
///
/// Writes follow the [`std::io::Write`] conventions, with `Poll::Pending` standing for
/// "not ready yet": the sink has registered the waker and the caller must retry.
pub trait ResponseSink {
    /// Returns the response status.
    fn status(&self) -> StatusCode;

    /// Sets the response status.
    fn set_status(&mut self, status: StatusCode);

    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the response headers for modification.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Attempts to write body bytes, returning how many were accepted.
    fn poll_write(&mut self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>>;

    /// Attempts to finish the body. Once this returns `Ready(Ok(()))` no more writes are allowed.
    fn poll_end(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;
}

/// A type-erased sink, as threaded through a pipeline of stages.
pub type BoxSink = Box<dyn ResponseSink + Send>;

impl<S: ResponseSink + ?Sized> ResponseSink for Box<S> {
    fn status(&self) -> StatusCode {
        (**self).status()
    }

    fn set_status(&mut self, status: StatusCode) {
        (**self).set_status(status)
    }

    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn poll_write(&mut self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        (**self).poll_write(cx, buf)
    }

    fn poll_end(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        (**self).poll_end(cx)
    }
}

/// Writes all of `buf`, waiting for the sink whenever it is not ready.
pub async fn write_all<S>(sink: &mut S, mut buf: &[u8]) -> io::Result<()>
where
    S: ResponseSink + ?Sized,
{
    while !buf.is_empty() {
        let n = poll_fn(|cx| sink.poll_write(cx, buf)).await?;
        if n == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }
        buf = &buf[n..];
    }
    Ok(())
}

/// Writes an optional last chunk and finishes the body.
pub async fn end<S>(sink: &mut S, last: Option<&[u8]>) -> io::Result<()>
where
    S: ResponseSink + ?Sized,
{
    if let Some(last) = last {
        write_all(sink, last).await?;
    }
    poll_fn(|cx| sink.poll_end(cx)).await
}

/// State machine for ending a compressed sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndState {
    /// Accepting writes.
    Writing,
    /// Trailer produced, draining it upstream.
    Draining,
    /// Waiting for the upstream sink to end.
    Ending,
    /// Everything has been handed upstream.
    Done,
}

/// A sink that compresses everything written to it before passing it upstream.
///
/// Encoded output is handed upstream before the next write is accepted, so a slow upstream
/// holds back the producer instead of piling up compressed data here. At most one chunk's
/// worth of output is buffered at a time.
#[derive(Debug)]
pub struct CompressedSink<S> {
    upstream: S,
    transform: Transform,
    pending: Bytes,
    state: EndState,
}

impl<S: ResponseSink> CompressedSink<S> {
    /// Wraps `upstream`, compressing with `codec`.
    pub fn new(upstream: S, codec: Codec) -> Self {
        Self {
            upstream,
            transform: Transform::new(codec),
            pending: Bytes::new(),
            state: EndState::Writing,
        }
    }

    /// Returns the codec this sink compresses with.
    pub fn codec(&self) -> Codec {
        self.transform.codec()
    }

    /// Returns a reference to the wrapped sink.
    pub fn upstream(&self) -> &S {
        &self.upstream
    }

    /// Consumes this sink, returning the wrapped sink.
    ///
    /// Output not yet handed upstream is discarded.
    pub fn into_upstream(self) -> S {
        self.upstream
    }

    /// Hands buffered output to the upstream sink.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while !self.pending.is_empty() {
            let n = ready!(self.upstream.poll_write(cx, &self.pending))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.pending.advance(n);
        }
        Poll::Ready(Ok(()))
    }
}

impl<S: ResponseSink> ResponseSink for CompressedSink<S> {
    fn status(&self) -> StatusCode {
        self.upstream.status()
    }

    fn set_status(&mut self, status: StatusCode) {
        self.upstream.set_status(status)
    }

    fn headers(&self) -> &HeaderMap {
        self.upstream.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.upstream.headers_mut()
    }

    fn poll_write(&mut self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if self.state != EndState::Writing {
            return Poll::Ready(Err(io::Error::other("write after end")));
        }
        ready!(self.poll_drain(cx))?;
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        self.pending = self.transform.encode(buf)?;
        // Start moving the output along; whatever is left goes out before the next write.
        if let Poll::Ready(Err(e)) = self.poll_drain(cx) {
            return Poll::Ready(Err(e));
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_end(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        loop {
            match self.state {
                EndState::Writing => {
                    ready!(self.poll_drain(cx))?;
                    self.pending = self.transform.finish()?;
                    self.state = EndState::Draining;
                }
                EndState::Draining => {
                    ready!(self.poll_drain(cx))?;
                    self.state = EndState::Ending;
                }
                EndState::Ending => {
                    ready!(self.upstream.poll_end(cx))?;
                    self.state = EndState::Done;
                }
                EndState::Done => return Poll::Ready(Ok(())),
            }
        }
    }
}
