use compression_codecs::{
    EncodeV2,
    brotli::{BrotliEncoder, params::EncoderParams as BrotliParams},
    gzip::GzipEncoder,
    zlib::ZlibEncoder,
};
use compression_core::Level;

/// Streaming compressors a stage can put in front of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Brotli compression.
    Brotli,
    /// Deflate compression (zlib framing, as HTTP defines `deflate`).
    Deflate,
    /// Gzip compression.
    Gzip,
}

impl Codec {
    /// Picks the compressor for a negotiated coding name.
    ///
    /// `br` and `deflate` get their own compressors. Every other name, including `gzip`,
    /// `x-gzip` and names this crate has never heard of, falls back to gzip. The coding name
    /// written to the response header is not affected by this fallback.
    pub fn for_coding(name: &str) -> Codec {
        match name {
            "br" => Codec::Brotli,
            "deflate" => Codec::Deflate,
            _ => Codec::Gzip,
        }
    }

    /// Returns the canonical Content-Encoding value for this codec.
    pub fn content_encoding(&self) -> &'static str {
        match self {
            Codec::Brotli => "br",
            Codec::Deflate => "deflate",
            Codec::Gzip => "gzip",
        }
    }

    /// Creates a new encoder for this codec.
    pub fn encoder(&self) -> Box<dyn EncodeV2 + Send> {
        match self {
            Codec::Brotli => Box::new(BrotliEncoder::new(BrotliParams::default())),
            Codec::Deflate => Box::new(ZlibEncoder::new(Level::Default.into())),
            Codec::Gzip => Box::new(GzipEncoder::new(Level::Default.into())),
        }
    }
}
