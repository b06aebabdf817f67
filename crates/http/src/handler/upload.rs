//! Multipart upload storage.
//!
//! The body is read whole (bounded by `max_body_bytes`), the file payload is
//! cut out by [`MultipartSplitter`] and stored under a freshly generated name
//! ending in `.png`, whatever the uploaded content actually is. The client
//! gets back a JSON document with the URL the file can be fetched from.

use std::io;
use std::path::Path;

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

use crate::connection::HttpConnection;
use crate::ensure;
use crate::protocol::{HttpError, MultipartSplitter, ParseError, SendError};

/// Suffix of every stored upload
pub const UPLOAD_SUFFIX: &str = ".png";

/// Owner read/write only
const UPLOAD_MODE: u32 = 0o600;

/// Length of the random part of a generated name
const RANDOM_LEN: usize = 6;

#[derive(Debug, Serialize)]
struct UploadReply<'a> {
    status: &'a str,
    url: String,
}

impl UploadReply<'_> {
    /// `{"status": "success", "url": "..."}`, on one line with a space after `:` and `,`
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut json = Vec::with_capacity(64 + self.url.len());
        self.serialize(&mut serde_json::Serializer::with_formatter(&mut json, SpacedFormatter))?;
        Ok(json)
    }
}

/// Compact output except for the separators inside objects.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// `label` is the name from the request target; it only appears in error pages.
pub(crate) async fn serve_upload<R, W>(connection: &mut HttpConnection<R, W>, label: &str) -> Result<(), HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let payload = match read_payload(connection).await {
        Ok(payload) => payload,
        Err(e) => return connection.reject(e).await,
    };

    let root_dir = connection.config().root_dir().to_path_buf();
    let file_name = match gen_unique_file_name(&root_dir, &connection.config().file_prefix) {
        Ok(file_name) => file_name,
        Err(e) => {
            error!(cause = %e, "can't generate unique file name");
            return connection
                .send_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "Tiny couldn't generate unique file name",
                    label,
                )
                .await;
        }
    };

    if let Err(e) = store(&root_dir.join(&file_name), &payload).await {
        error!(file = %file_name, cause = %e, "can't store upload");
        return connection
            .send_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "Tiny couldn't store the uploaded file",
                label,
            )
            .await;
    }
    info!(file = %file_name, size = payload.len(), "stored upload");

    let reply = UploadReply { status: "success", url: connection.config().public_url.file_url(&file_name) };
    let json = reply.to_json().map_err(SendError::invalid_body)?;
    connection.send_json(Bytes::from(json)).await
}

async fn read_payload<R, W>(connection: &mut HttpConnection<R, W>) -> Result<Bytes, ParseError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let meta = connection.read_header_meta().await?;
    let length = meta.content_length().ok_or(ParseError::MissingContentLength)?;

    let max_body_bytes = connection.config().max_body_bytes;
    ensure!(length <= max_body_bytes, ParseError::too_large_body(length, max_body_bytes));
    debug!(content_type = meta.content_type(), length, "read upload body");

    let body = connection.read_body(length).await?;
    MultipartSplitter::new(meta.boundary()).split(body)
}

/// Generates a name that does not exist in `dir`: `<prefix>` plus six random
/// alphanumerics plus [`UPLOAD_SUFFIX`].
///
/// Uniqueness is established by creating the file exclusively; the placeholder
/// is removed again before returning, so no empty file is left behind.
pub fn gen_unique_file_name(dir: &Path, prefix: &str) -> io::Result<String> {
    let placeholder = tempfile::Builder::new().prefix(prefix).rand_bytes(RANDOM_LEN).tempfile_in(dir)?.into_temp_path();

    let base_name = placeholder
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "generated name is not utf-8"))?;

    placeholder.close()?;
    Ok(base_name + UPLOAD_SUFFIX)
}

async fn store(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).mode(UPLOAD_MODE).open(path).await?;
    file.write_all(payload).await?;
    file.flush().await
}
