//! Connection handling
//!
//! [`HttpConnection`] is the entry point of the crate: given the two halves of
//! an accepted stream it services exactly one request and returns. The caller
//! owns the stream and closes it afterwards.
//!
//! [`MessageWriter`] assembles and writes the response: HTML error pages, JSON
//! upload results and file bodies written from a mapped view.

mod http_connection;
mod message_writer;

pub use http_connection::HttpConnection;
pub use message_writer::MessageWriter;
