use crate::negotiate::{Coding, Negotiator, Policy};
use crate::service::CompressionService;
use tower::Layer;

/// Default minimum body size for compression (approximately 1 MTU).
pub const DEFAULT_MIN_SIZE: usize = 860;

/// A Tower layer that compresses HTTP response bodies.
///
/// Several layers can be stacked; each adds its own coding, and `Content-Encoding` ends up
/// listing them in the order they were applied to the body.
#[derive(Debug, Clone)]
pub struct CompressionLayer {
    policy: Policy,
    negotiator: Negotiator,
    min_size: usize,
}

impl CompressionLayer {
    /// Creates a new compression layer with default settings.
    ///
    /// The layer follows the client's preferences, resolves `*` to `br`, and skips bodies
    /// known to be smaller than 860 bytes.
    pub fn new() -> Self {
        Self {
            policy: Policy::Auto,
            negotiator: Negotiator::default(),
            min_size: DEFAULT_MIN_SIZE,
        }
    }

    /// Sets how the coding is chosen.
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the coding a `*` in `Accept-Encoding` resolves to.
    pub fn default_coding(mut self, coding: Coding) -> Self {
        self.negotiator = Negotiator::new(coding);
        self
    }

    /// Sets the minimum body size required for compression.
    ///
    /// Responses with a known Content-Length smaller than this value
    /// will not be compressed.
    pub fn min_size(mut self, size: usize) -> Self {
        self.min_size = size;
        self
    }
}

impl Default for CompressionLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for CompressionLayer {
    type Service = CompressionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CompressionService::new(
            inner,
            self.policy.clone(),
            self.negotiator.clone(),
            self.min_size,
        )
    }
}
