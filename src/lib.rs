//! Stackable HTTP response compression.
//!
//! Each compression stage picks a content coding from its policy and the client's
//! `Accept-Encoding` preferences, then puts a streaming compressor between the body producer
//! and whatever the response was going to be written to. Stages compose: every stage wraps
//! the output of the previous one, and `Content-Encoding` lists the applied codings in the
//! order a client has to undo them from the right.
//!
//! Two front-ends share the negotiation and header rules:
//!
//! - [`CompressionLayer`], a Tower layer that wraps response bodies.
//! - [`Pipeline`] of [`CompressionStage`]s over push-style [`ResponseSink`]s, for servers
//!   that write bodies instead of returning them.
//!
//! # Example
//!
//! ```ignore
//! use http_stage_compression::{CompressionLayer, Policy};
//! use tower::ServiceBuilder;
//!
//! let service = ServiceBuilder::new()
//!     .layer(CompressionLayer::new())
//!     .layer(CompressionLayer::new().policy("gzip".parse()?))
//!     .service(my_service);
//! ```
//!
//! # Negotiation
//!
//! An explicit policy always wins. In auto mode the client's codings are scanned in
//! preference order: `identity` and `compress` are skipped, `*` picks the default coding
//! (`br` unless configured otherwise), and any other name is used as-is. A missing
//! `Accept-Encoding` header counts as `*`. `br` and `deflate` get their own compressors;
//! every other name is compressed with gzip but still recorded under its own name.
//!
//! # Compression Rules
//!
//! The Tower layer will **not** compress responses when:
//! - Negotiation found no coding
//! - `Content-Range` header is present (range responses)
//! - `Content-Type` starts with `image/` (except `image/svg+xml`)
//! - `Content-Type` starts with `application/grpc` (except `application/grpc-web`)
//! - `Content-Length` is below the minimum size threshold (default: 860 bytes)
//!
//! The layer will **always flush** after each chunk when:
//! - `X-Accel-Buffering: no` header is present
//! - `Content-Type` is `text/event-stream`
//! - `Content-Type` starts with `application/grpc-web`
//!
//! # Response Modifications
//!
//! When compression is applied:
//! - The coding is added to the `Content-Encoding` history
//! - `Content-Length` header is removed (compressed size is unknown)
//! - `Accept-Ranges` header is removed (Tower layer)
//! - `Vary` header includes `Accept-Encoding` (Tower layer)

#![deny(missing_docs)]

mod accept;
mod body;
mod codec;
mod error;
mod future;
pub mod history;
mod layer;
mod negotiate;
mod service;
pub mod sink;
mod stage;
mod transform;

#[cfg(test)]
mod test_util;

pub use accept::acceptable_codings;
pub use body::CompressionBody;
pub use codec::Codec;
pub use error::Error;
pub use future::ResponseFuture;
pub use layer::{CompressionLayer, DEFAULT_MIN_SIZE};
pub use negotiate::{Coding, DEFAULT_CODING, Decision, Negotiator, Policy};
pub use service::CompressionService;
pub use sink::{BoxSink, CompressedSink, ResponseSink};
pub use stage::{CompressionStage, Pipeline};
pub use transform::Transform;
