use crate::codec::Codec;
use bytes::{Bytes, BytesMut};
use compression_codecs::EncodeV2;
use compression_core::util::{PartialBuffer, WriteBuffer};
use std::fmt;
use std::io;
use tracing::trace;

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024; // 8KB output buffer

/// One streaming compressor instance.
///
/// Every call returns whatever encoded bytes the compressor produced for it, which may be
/// empty while the compressor is still buffering input.
pub struct Transform {
    codec: Codec,
    encoder: Box<dyn EncodeV2 + Send>,
    output_buffer: Vec<u8>,
    finished: bool,
}

impl Transform {
    /// Creates a compressor for the given codec.
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            encoder: codec.encoder(),
            output_buffer: vec![0u8; OUTPUT_BUFFER_SIZE],
            finished: false,
        }
    }

    /// Returns the codec this transform compresses with.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Returns whether the compressed trailer has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Compresses a chunk of input data.
    pub fn encode(&mut self, input: &[u8]) -> io::Result<Bytes> {
        if self.finished {
            return Err(io::Error::other("write after compressed stream was finished"));
        }
        // gzip and zlib encoders reject an empty input buffer.
        if input.is_empty() {
            return Ok(Bytes::new());
        }

        let mut input_buf = PartialBuffer::new(input);
        let mut all_output = BytesMut::new();

        // Keep encoding until all input is consumed
        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
            self.encoder
                .encode(&mut input_buf, &mut output)
                .map_err(io::Error::other)?;

            let written = output.written_len();
            if written > 0 {
                all_output.extend_from_slice(&self.output_buffer[..written]);
            }

            if input_buf.written_len() >= input.len() {
                break;
            }
            if written == 0 && input_buf.written_len() == 0 {
                return Err(io::Error::other("encoder made no progress"));
            }
        }

        trace!(
            codec = self.codec.content_encoding(),
            input = input.len(),
            output = all_output.len(),
            "encoded chunk"
        );
        Ok(all_output.freeze())
    }

    /// Flushes everything buffered so far without ending the stream.
    pub fn flush(&mut self) -> io::Result<Bytes> {
        if self.finished {
            return Ok(Bytes::new());
        }
        let mut all_output = BytesMut::new();
        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
            let done = self.encoder.flush(&mut output).map_err(io::Error::other)?;
            let written = output.written_len();
            all_output.extend_from_slice(&self.output_buffer[..written]);
            if done {
                return Ok(all_output.freeze());
            }
        }
    }

    /// Ends the stream, returning the remaining output and the compressed trailer.
    ///
    /// Calling it again returns nothing.
    pub fn finish(&mut self) -> io::Result<Bytes> {
        if self.finished {
            return Ok(Bytes::new());
        }
        let mut all_output = BytesMut::new();
        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());
            let done = self.encoder.finish(&mut output).map_err(io::Error::other)?;
            let written = output.written_len();
            all_output.extend_from_slice(&self.output_buffer[..written]);
            if done {
                self.finished = true;
                return Ok(all_output.freeze());
            }
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("codec", &self.codec)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::decode;

    fn compress(codec: Codec, chunks: &[&[u8]]) -> Vec<u8> {
        let mut transform = Transform::new(codec);
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend_from_slice(&transform.encode(chunk).unwrap());
        }
        out.extend_from_slice(&transform.finish().unwrap());
        out
    }

    #[test]
    fn test_each_codec_round_trips() {
        let chunks: &[&[u8]] = &[b"Hello ", b"World", b"", b"!"];
        for codec in [Codec::Brotli, Codec::Deflate, Codec::Gzip] {
            let encoded = compress(codec, chunks);
            assert_eq!(decode(codec, &encoded), b"Hello World!");
        }
    }

    #[test]
    fn test_empty_chunk_is_a_no_op() {
        for codec in [Codec::Brotli, Codec::Deflate, Codec::Gzip] {
            let mut transform = Transform::new(codec);
            assert!(transform.encode(b"").unwrap().is_empty());
            let mut out = transform.encode(b"Hello").unwrap().to_vec();
            assert!(transform.encode(b"").unwrap().is_empty());
            out.extend_from_slice(&transform.encode(b" World").unwrap());
            out.extend_from_slice(&transform.finish().unwrap());
            assert_eq!(decode(codec, &out), b"Hello World");
        }
    }

    #[test]
    fn test_gzip_magic() {
        let encoded = compress(Codec::Gzip, &[b"hello"]);
        assert_eq!(&encoded[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_large_input() {
        let input: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        for codec in [Codec::Brotli, Codec::Deflate, Codec::Gzip] {
            let encoded = compress(codec, &[&input]);
            assert_eq!(decode(codec, &encoded), input);
        }
    }

    #[test]
    fn test_flush_emits_buffered_data() {
        let mut transform = Transform::new(Codec::Gzip);
        let mut out = transform.encode(b"partial").unwrap().to_vec();
        out.extend_from_slice(&transform.flush().unwrap());
        // Header plus at least one flushed block.
        assert!(out.len() > 10);
        assert_eq!(&out[..2], &[0x1f, 0x8b]);
        assert!(!transform.is_finished());
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut transform = Transform::new(Codec::Deflate);
        transform.encode(b"data").unwrap();
        assert!(!transform.finish().unwrap().is_empty());
        assert!(transform.is_finished());
        assert!(transform.finish().unwrap().is_empty());
        assert!(transform.encode(b"more").is_err());
    }
}
