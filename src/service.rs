use crate::accept::acceptable_codings;
use crate::future::ResponseFuture;
use crate::negotiate::{Negotiator, Policy};
use http::Request;
use std::task::{Context, Poll};
use tower::Service;

/// A Tower service that compresses HTTP response bodies.
#[derive(Debug, Clone)]
pub struct CompressionService<S> {
    inner: S,
    policy: Policy,
    negotiator: Negotiator,
    min_size: usize,
}

impl<S> CompressionService<S> {
    /// Creates a new compression service wrapping the given inner service.
    pub fn new(inner: S, policy: Policy, negotiator: Negotiator, min_size: usize) -> Self {
        Self {
            inner,
            policy,
            negotiator,
            min_size,
        }
    }

    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the inner service.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes this service, returning the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CompressionService<S>
where
    S: Service<Request<ReqBody>, Response = http::Response<ResBody>>,
{
    type Response = http::Response<crate::body::CompressionBody<ResBody>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let decision = self
            .negotiator
            .decide(&self.policy, acceptable_codings(req.headers()));

        let forced = matches!(self.policy, Policy::Explicit(_));

        let inner = self.inner.call(req);

        ResponseFuture::new(inner, decision.into_coding(), self.min_size, forced)
    }
}
