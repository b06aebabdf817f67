//! HTTP request decoder module
//!
//! The decoder has two modes. By default it frames the request head line by
//! line through a [`LineDecoder`]; after the connection calls
//! [`RequestDecoder::expect_body`] it yields the next `length` bytes as a single
//! body through a [`LengthDecoder`] and then falls back to line mode.
//!
//! # Example
//!
//! ```no_run
//! use tinyweb_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new(8 * 1024);
//! let mut buffer = BytesMut::from(&b"GET /file/index.html HTTP/1.0\r\n\r\n"[..]);
//! let request_line = decoder.decode(&mut buffer);
//! ```

use crate::codec::body::LengthDecoder;
use crate::codec::line::LineDecoder;
use crate::config::DEFAULT_MAX_LINE_BYTES;
use crate::protocol::{Message, ParseError};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for one request: head lines, then optionally a body.
///
/// # State Machine
///
/// The decoder maintains its state through the `body_decoder` field:
/// - `None`: producing head lines
/// - `Some(LengthDecoder)`: collecting a body
#[derive(Debug)]
pub struct RequestDecoder {
    line_decoder: LineDecoder,
    body_decoder: Option<LengthDecoder>,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` accepting lines up to `max_line_bytes`
    pub fn new(max_line_bytes: usize) -> Self {
        Self { line_decoder: LineDecoder::new(max_line_bytes), body_decoder: None }
    }

    /// Switches to body mode: the next message is a [`Message::Body`] of exactly `length` bytes.
    pub fn expect_body(&mut self, length: usize) {
        self.body_decoder = Some(LengthDecoder::new(length));
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl Decoder for RequestDecoder {
    type Item = Message;
    type Error = ParseError;

    /// Attempts to decode the next head line or the pending body
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Line(_)))`: a complete head line
    /// - `Ok(Some(Message::Body(_)))`: the complete body requested by `expect_body`
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the line or body is malformed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(body_decoder) = &mut self.body_decoder {
            let message = body_decoder.decode(src)?.map(Message::Body);
            if message.is_some() {
                self.body_decoder.take();
            }
            return Ok(message);
        }

        Ok(self.line_decoder.decode(src)?.map(Message::Line))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(body_decoder) = &mut self.body_decoder {
            let message = body_decoder.decode_eof(buf)?.map(Message::Body);
            self.body_decoder.take();
            return Ok(message);
        }

        Ok(self.line_decoder.decode_eof(buf)?.map(Message::Line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn head_then_body() {
        let mut buffer = BytesMut::from("POST /upload/a.png HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello");
        let mut decoder = RequestDecoder::new(1024);

        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(Message::Line("POST /upload/a.png HTTP/1.0".into())));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(Message::Line("Content-Length: 5".into())));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(Message::Line("".into())));

        decoder.expect_body(5);
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(Message::Body("hello".into())));
        assert!(buffer.is_empty());

        // back to line framing once the body was produced
        buffer.extend_from_slice(b"next
");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(Message::Line("next".into())));
    }

    #[test]
    fn body_bytes_are_not_split_on_newlines() {
        let mut buffer = BytesMut::from(&b"a\nb\r\nc"[..]);
        let mut decoder = RequestDecoder::new(1024);

        decoder.expect_body(6);
        let message = decoder.decode(&mut buffer).unwrap();

        assert_eq!(message, Some(Message::Body(Bytes::from_static(b"a\nb\r\nc"))));
    }

    #[test]
    fn truncated_body_at_eof() {
        let mut buffer = BytesMut::from(&b"abc"[..]);
        let mut decoder = RequestDecoder::new(1024);

        decoder.expect_body(10);

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(matches!(decoder.decode_eof(&mut buffer), Err(ParseError::InvalidBody { .. })));
    }
}
