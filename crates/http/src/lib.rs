//! A single-request HTTP/1.0 core serving static files and multipart uploads
//!
//! The crate services one already-accepted connection at a time: it reads a
//! request line, dispatches on the target, writes exactly one response and
//! hands the stream back to its caller. Accepting connections, spawning tasks
//! and closing streams are the caller's business.
//!
//! # Endpoints
//!
//! - `GET /file/<name>`: the file `<name>` under the configured root, with a
//!   content type guessed from its extension and the body written from a
//!   read-only memory map
//! - `POST /upload/<name>`: a `multipart/form-data` body with a single file
//!   part; the payload is stored under a generated `.png` name and the reply is
//!   `{"status": "success", "url": "<scheme>://<host>:<port>/file/<generated>"}`
//!
//! Anything else is answered with a small HTML error page: `405` for methods
//! other than `GET`/`POST`, `400` for unknown targets or a method the endpoint
//! does not accept, `404`/`403` for missing or unreadable files.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::io::AsyncWriteExt;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use tinyweb_http::config::ServeConfig;
//! use tinyweb_http::connection::HttpConnection;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Arc::new(ServeConfig::default());
//!     let tcp_listener = TcpListener::bind("127.0.0.1:8080").await.expect("bind server error");
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let config = Arc::clone(&config);
//!         tokio::spawn(async move {
//!             let (reader, mut writer) = tcp_stream.into_split();
//!             match HttpConnection::new(reader, &mut writer, config).process().await {
//!                 Ok(()) => info!("finished process"),
//!                 Err(e) => error!("service has error, cause {}", e),
//!             }
//!             let _ = writer.shutdown().await;
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: the per-connection context and dispatcher, and the response writer
//! - [`handler`]: static file and upload handlers
//! - [`protocol`]: request line, target classification, header metadata,
//!   multipart splitting, response heads and error types
//! - [`codec`]: line/body framing of requests and serialization of responses
//! - [`config`]: limits, serving root and the public URL of uploads
//!
//! # Limitations
//!
//! - One request per connection, HTTP/1.0 responses only
//! - Names are not decoded or normalized, so `..` and absolute names escape the root
//! - The upload body must start with exactly four preamble lines; the closing
//!   boundary is stored along with the payload
//! - No read or write timeouts: a stalled peer holds its task indefinitely
//! - Unix only (owner-read check on mode bits, `0o600` upload files)

pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
