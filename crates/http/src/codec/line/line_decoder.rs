//! Line framing for the request head.
//!
//! Every line of the request head (request line, header lines, the blank
//! separator) is produced separately so that the dispatcher and the handlers
//! can consume exactly what they need and leave the rest of the buffer for the
//! body.

use std::cmp;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

/// Decodes `\n` terminated lines, stripping the terminator and an optional `\r`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDecoder {
    /// Longest accepted line, terminator included
    max_length: usize,
    /// Where to resume scanning for `\n`, so partial reads are not rescanned
    next_index: usize,
}

impl LineDecoder {
    pub fn new(max_length: usize) -> Self {
        Self { max_length, next_index: 0 }
    }
}

impl Decoder for LineDecoder {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let scan_end = cmp::min(src.len(), self.max_length);
        let newline = src[self.next_index.min(scan_end)..scan_end].iter().position(|b| *b == b'\n');

        match newline {
            Some(offset) => {
                let line_end = self.next_index + offset + 1;
                self.next_index = 0;

                let mut line = src.split_to(line_end);
                line.truncate(line.len() - 1);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                trace!(line_size = line_end, "decoded line");
                Ok(Some(line.freeze()))
            }
            None => {
                ensure!(src.len() < self.max_length, ParseError::too_large_line(src.len(), self.max_length));
                self.next_index = scan_end;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }

        self.next_index = 0;
        if buf.is_empty() {
            return Ok(None);
        }

        // the peer closed mid-line: hand out what is left as a final line
        let mut line = buf.split();
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Ok(Some(line.freeze()))
    }
}
