use thiserror::Error;

/// Errors raised while configuring stages or recording codings.
///
/// Failures on the byte path are reported as [`std::io::Error`] instead, since they come from
/// the codec or the downstream sink.
#[derive(Error, Debug)]
pub enum Error {
    /// The coding name cannot appear in a `Content-Encoding` value.
    #[error("invalid coding name: {0:?}")]
    InvalidCoding(String),

    /// The configured policy is not one of `auto`, `br`, `deflate`, `gzip` or `x-gzip`.
    #[error("unknown compression policy: {0:?}")]
    UnknownPolicy(String),

    /// The accumulated coding history is not a valid header value.
    #[error("invalid Content-Encoding value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}
