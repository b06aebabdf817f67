//! Serialization of responses.
//!
//! A [`ResponseHead`] is written as `HTTP/1.0 <code> <reason>\r\n`, one
//! `Name: value\r\n` line per header in insertion order, and the blank line.
//! Buffered bodies (error pages, JSON) are appended as raw bytes; file bodies
//! never pass through the encoder.

use crate::protocol::{ResponseHead, SendError};

use bytes::{BufMut, Bytes, BytesMut};
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for head serialization
const INIT_HEADER_SIZE: usize = 256;

#[derive(Debug, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<ResponseHead> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, head: ResponseHead, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "HTTP/1.0 {} {}\r\n", head.status().as_str(), head.reason())?;

        for (name, value) in head.headers() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

impl Encoder<Bytes> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, body: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&body);
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// Lets `write!` format straight into the buffer without an intermediate `String`.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::response::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
    use http::StatusCode;

    #[test]
    fn encode_head_in_order() {
        let head = ResponseHead::ok()
            .header(SERVER, "Tiny Web Server")
            .header(CONNECTION, "close")
            .header(CONTENT_LENGTH, 50)
            .header(CONTENT_TYPE, "text/html");
        let mut buffer = BytesMut::new();

        ResponseEncoder::new().encode(head, &mut buffer).unwrap();

        assert_eq!(
            &buffer[..],
            b"HTTP/1.0 200 OK\r\n\
              Server: Tiny Web Server\r\n\
              Connection: close\r\n\
              Content-length: 50\r\n\
              Content-type: text/html\r\n\
              \r\n"
        );
    }

    #[test]
    fn caller_reason_phrase_is_kept() {
        let mut buffer = BytesMut::new();

        ResponseEncoder::new().encode(ResponseHead::new(StatusCode::NOT_FOUND, "Not Found"), &mut buffer).unwrap();
        ResponseEncoder::new().encode(Bytes::from_static(b"body"), &mut buffer).unwrap();

        assert_eq!(&buffer[..], b"HTTP/1.0 404 Not Found\r\n\r\nbody");
    }
}
