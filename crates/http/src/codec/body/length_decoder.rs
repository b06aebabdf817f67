//! Decoder for a request body whose size is given by `Content-Length`.
//!
//! Unlike a streaming decoder, the whole body is collected before anything is
//! yielded: the upload path needs the complete multipart body to locate the
//! payload. The caller bounds `length` before creating the decoder.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::ParseError;

/// Collects exactly `length` bytes and yields them as one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The number of bytes the body must contain
    length: usize,
}

impl LengthDecoder {
    /// Creates a new `LengthDecoder` for a body of `length` bytes.
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Decoder for LengthDecoder {
    type Item = Bytes;
    type Error = ParseError;

    /// Returns `Ok(None)` until `length` bytes are buffered, then splits them off.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < self.length {
            src.reserve(self.length - src.len());
            return Ok(None);
        }

        trace!(body_size = self.length, "decoded body");
        Ok(Some(src.split_to(self.length).freeze()))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(body) => Ok(Some(body)),
            None => Err(ParseError::invalid_body(format!(
                "connection closed after {} of {} body bytes",
                buf.len(),
                self.length
            ))),
        }
    }
}
