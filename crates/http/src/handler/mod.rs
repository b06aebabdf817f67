//! Request handlers
//!
//! - [`static_file`]: `GET /file/<name>` answers with the file, mapped into memory
//! - [`upload`]: `POST /upload/<name>` stores the multipart payload and answers with JSON
//!
//! Both read the request headers first; the dispatcher in
//! [`HttpConnection`](crate::connection::HttpConnection) has only consumed the
//! request line when it calls them.

pub mod static_file;
pub mod upload;

pub(crate) use static_file::serve_static_file;
pub(crate) use upload::serve_upload;

pub use static_file::content_type_for;
pub use upload::gen_unique_file_name;
