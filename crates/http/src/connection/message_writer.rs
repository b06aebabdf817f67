use crate::codec::ResponseEncoder;
use crate::ensure;
use crate::protocol::response::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use crate::protocol::{ErrorPage, ResponseHead, SendError};
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::trace;

/// Buffers and writes the single response of a connection.
///
/// Heads and buffered bodies are encoded into `buffer` and written with one
/// `write_all`; a file body is written straight from the caller's slice.
#[derive(Debug)]
pub struct MessageWriter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: ResponseEncoder,
    max_body_size: usize,
}

impl<W> MessageWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// `max_body_size` bounds error page and JSON bodies.
    pub fn with_capacity(writer: W, buffer_size: usize, max_body_size: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(buffer_size), encoder: ResponseEncoder::new(), max_body_size }
    }

    /// Writes an HTML error page.
    pub async fn send_error(&mut self, page: &ErrorPage<'_>) -> Result<(), SendError> {
        let body = page.render();
        ensure!(body.len() <= self.max_body_size, SendError::too_large_response(body.len(), self.max_body_size));

        self.encoder.encode(page.head(body.len()), &mut self.buffer)?;
        self.encoder.encode(Bytes::from(body), &mut self.buffer)?;
        self.flush().await
    }

    /// Writes a `200 OK` JSON response; the reason phrase is always `OK`.
    pub async fn send_json(&mut self, server_name: &str, json: Bytes) -> Result<(), SendError> {
        ensure!(json.len() <= self.max_body_size, SendError::too_large_response(json.len(), self.max_body_size));

        let head = ResponseHead::ok()
            .header(SERVER, server_name)
            .header(CONNECTION, "close")
            .header(CONTENT_LENGTH, json.len())
            .header(CONTENT_TYPE, mime::APPLICATION_JSON);
        self.encoder.encode(head, &mut self.buffer)?;
        self.encoder.encode(json, &mut self.buffer)?;
        self.flush().await
    }

    /// Writes `head`, then `body` without copying it into the buffer.
    pub async fn send_file(&mut self, head: ResponseHead, body: &[u8]) -> Result<(), SendError> {
        self.encoder.encode(head, &mut self.buffer)?;
        self.write_buffer().await?;

        trace!(body_size = body.len(), "write file body");
        self.writer.write_all(body).await?;
        Ok(self.writer.flush().await?)
    }

    #[inline]
    pub async fn flush(&mut self) -> Result<(), SendError> {
        self.write_buffer().await?;
        Ok(self.writer.flush().await?)
    }

    async fn write_buffer(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.writer.write_all(self.buffer.as_ref()).await?;
        self.buffer.clear();
        Ok(())
    }
}
