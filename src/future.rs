use crate::body::CompressionBody;
use crate::history;
use crate::negotiate::Coding;
use http::{Response, header};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, warn};

pin_project! {
    /// Future for compression service responses.
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        coding: Option<Coding>,
        min_size: usize,
        forced: bool,
    }
}

impl<F> ResponseFuture<F> {
    /// A `forced` coding comes from an explicit policy and bypasses the skip rules.
    pub(crate) fn new(inner: F, coding: Option<Coding>, min_size: usize, forced: bool) -> Self {
        Self {
            inner,
            coding,
            min_size,
            forced,
        }
    }
}

impl<F, B, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<CompressionBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        match this.inner.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Ready(Ok(response)) => {
                let coding = this.coding.take();
                let response = if *this.forced {
                    force_response(response, coding)
                } else {
                    wrap_response(response, coding, *this.min_size)
                };
                Poll::Ready(Ok(response))
            }
        }
    }
}

/// Wraps the response body with compression if appropriate.
fn wrap_response<B>(
    response: Response<B>,
    coding: Option<Coding>,
    min_size: usize,
) -> Response<CompressionBody<B>> {
    let (parts, body) = response.into_parts();

    let coding = coding.filter(|_| {
        !has_content_range(&parts.headers)
            && !is_uncompressible_content_type(&parts.headers)
            && !is_below_min_size(&parts.headers, min_size)
    });

    match coding {
        Some(coding) => compress_response(parts, body, coding),
        None => Response::from_parts(parts, CompressionBody::passthrough(body)),
    }
}

/// Compresses the response body whatever its size or content type.
fn force_response<B>(response: Response<B>, coding: Option<Coding>) -> Response<CompressionBody<B>> {
    let (parts, body) = response.into_parts();
    match coding {
        Some(coding) => compress_response(parts, body, coding),
        None => Response::from_parts(parts, CompressionBody::passthrough(body)),
    }
}

/// Records the coding and wraps the body in its compressor.
///
/// Layers see the response innermost first, which is also the order their compressors
/// touch the body, so the coding is appended to the history.
fn compress_response<B>(
    mut parts: http::response::Parts,
    body: B,
    coding: Coding,
) -> Response<CompressionBody<B>> {
    if let Err(e) = history::append(&mut parts.headers, &coding) {
        warn!(coding = %coding, error = %e, "cannot record coding, sending body uncompressed");
        return Response::from_parts(parts, CompressionBody::passthrough(body));
    }

    // Check for x-accel-buffering: no header or streaming content types
    let always_flush = parts
        .headers
        .get("x-accel-buffering")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("no"))
        || is_streaming_content_type(&parts.headers);

    // The compressed size is unknown and ranges no longer line up with the body.
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::ACCEPT_RANGES);

    add_vary_accept_encoding(&mut parts.headers);

    let codec = coding.codec();
    debug!(
        coding = %coding,
        codec = codec.content_encoding(),
        always_flush,
        "compressing response body"
    );
    Response::from_parts(parts, CompressionBody::compressed(body, codec, always_flush))
}

/// Checks if Content-Range header is present (range response).
fn has_content_range(headers: &header::HeaderMap) -> bool {
    headers.contains_key(header::CONTENT_RANGE)
}

/// Adds Accept-Encoding to the Vary header if not already present.
fn add_vary_accept_encoding(headers: &mut header::HeaderMap) {
    let covered = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|vary| vary.to_str().ok())
        .flat_map(|vary| vary.split(','))
        .map(str::trim)
        .any(|v| v == "*" || v.eq_ignore_ascii_case("accept-encoding"));
    if covered {
        return;
    }

    headers.append(
        header::VARY,
        header::HeaderValue::from_static("accept-encoding"),
    );
}

/// Checks if the content type should not be compressed.
fn is_uncompressible_content_type(headers: &header::HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    // Skip all images except SVG
    if content_type.starts_with("image/") {
        return !content_type.starts_with("image/svg+xml");
    }

    // Skip gRPC except grpc-web
    if content_type.starts_with("application/grpc") {
        return !content_type.starts_with("application/grpc-web");
    }

    false
}

/// Checks if the content type requires always flushing (e.g., streaming).
fn is_streaming_content_type(headers: &header::HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.starts_with("text/event-stream") || ct.starts_with("application/grpc-web")
        })
}

/// Checks if Content-Length is below the minimum size.
fn is_below_min_size(headers: &header::HeaderMap, min_size: usize) -> bool {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len < min_size)
}
