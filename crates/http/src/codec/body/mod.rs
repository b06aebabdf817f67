//! Request body framing.
//!
//! Only `Content-Length` delimited bodies exist in this HTTP/1.0 subset; see
//! [`LengthDecoder`].

mod length_decoder;

pub use length_decoder::LengthDecoder;
