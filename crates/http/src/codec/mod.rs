//! Framing of requests and serialization of responses
//!
//! Requests are read through [`RequestDecoder`], a `tokio_util` [`Decoder`](tokio_util::codec::Decoder)
//! that yields the head one line at a time and, on demand, a whole
//! `Content-Length` body. Responses are serialized by [`ResponseEncoder`].
//!
//! # Example
//!
//! ```no_run
//! use tinyweb_http::codec::{RequestDecoder, ResponseEncoder};
//! use tinyweb_http::protocol::ResponseHead;
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::BytesMut;
//!
//! // Decode the request line
//! let mut decoder = RequestDecoder::new(8 * 1024);
//! let mut request_buffer = BytesMut::from(&b"GET /file/a.txt HTTP/1.0\r\n"[..]);
//! let line = decoder.decode(&mut request_buffer);
//!
//! // Encode a response head
//! let mut encoder = ResponseEncoder::new();
//! let mut response_buffer = BytesMut::new();
//! encoder.encode(ResponseHead::ok(), &mut response_buffer).unwrap();
//! ```

mod body;
mod line;
mod request_decoder;
mod response_encoder;

pub use body::LengthDecoder;
pub use line::LineDecoder;
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
