use crate::codec::Codec;
use crate::sink::ResponseSink;
use http::{HeaderMap, StatusCode};
use std::future::Future;
use std::io::{self, Read};
use std::pin::pin;
use std::task::{Context, Poll, Waker};

/// Decodes `data` with an independent reference decoder.
pub(crate) fn decode(codec: Codec, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    match codec {
        Codec::Brotli => brotli::Decompressor::new(data, 4096)
            .read_to_end(&mut out)
            .unwrap(),
        Codec::Deflate => flate2::read::ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .unwrap(),
        Codec::Gzip => flate2::read::GzDecoder::new(data)
            .read_to_end(&mut out)
            .unwrap(),
    };
    out
}

/// Undoes a coding history, rightmost coding first.
pub(crate) fn decode_history(history: &[String], data: &[u8]) -> Vec<u8> {
    history.iter().rev().fold(data.to_vec(), |bytes, coding| {
        decode(Codec::for_coding(coding), &bytes)
    })
}

/// Drives a future to completion, re-polling whenever it is pending.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
    }
}

/// A terminal sink collecting the body in memory.
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    ended: bool,
    chunk_limit: Option<usize>,
    stall: bool,
    pending_polls: usize,
    failing: bool,
}

impl MemorySink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Accepts at most `limit` bytes per write and is pending on every other poll.
    pub(crate) fn throttled(mut self, limit: usize) -> Self {
        self.chunk_limit = Some(limit);
        self
    }

    /// Fails every write as if the client went away.
    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.ended
    }

    pub(crate) fn pending_polls(&self) -> usize {
        self.pending_polls
    }
}

impl ResponseSink for MemorySink {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn poll_write(&mut self, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if self.failing {
            return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
        }
        assert!(!self.ended, "write after end");
        let Some(limit) = self.chunk_limit else {
            self.body.extend_from_slice(buf);
            return Poll::Ready(Ok(buf.len()));
        };
        if self.stall {
            self.stall = false;
            self.pending_polls += 1;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        self.stall = true;
        let n = buf.len().min(limit);
        self.body.extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_end(&mut self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.failing {
            return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
        }
        self.ended = true;
        Poll::Ready(Ok(()))
    }
}
