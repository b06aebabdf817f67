//! Protocol types for the single-request HTTP/1.0 subset this server speaks.
//!
//! - [`RequestLine`]: method, target and version of the first request line
//! - [`Target`] / [`Endpoint`]: classification of `/file/<name>` and `/upload/<name>`
//! - [`HeaderMeta`]: the `Content-Type` and `Content-Length` of a request
//! - [`MultipartSplitter`]: locates the file payload of an upload body
//! - [`ResponseHead`] / [`ErrorPage`]: what gets written back
//! - [`HttpError`], [`ParseError`], [`SendError`]: error types
//!
//! Nothing here performs I/O; the [`connection`](crate::connection) layer feeds
//! these types from the socket.

mod message;
pub use message::Message;

mod request;
pub use request::RequestLine;

mod target;
pub use target::Endpoint;
pub use target::Target;

mod header;
pub use header::HeaderMeta;

pub mod multipart;
pub use multipart::MultipartSplitter;

pub mod response;
pub use response::ErrorPage;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
