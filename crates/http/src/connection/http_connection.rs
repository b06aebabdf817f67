use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use http::{Method, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};

use crate::codec::RequestDecoder;
use crate::config::ServeConfig;
use crate::connection::message_writer::MessageWriter;
use crate::handler::{serve_static_file, serve_upload};
use crate::protocol::{
    Endpoint, ErrorPage, HeaderMeta, HttpError, Message, ParseError, RequestLine, ResponseHead, Target,
};

/// Initial capacity of the read buffer
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Initial capacity of the write buffer
const WRITE_BUFFER_SIZE: usize = 4 * 1024;

/// Services exactly one request on an accepted connection.
///
/// `HttpConnection` is the per-connection context: it owns the read buffer,
/// the decoder state and the response writer, so nothing is shared between
/// concurrently served connections. It reads the request line, dispatches to
/// the static file or upload handler and writes one response. Closing the
/// underlying stream is left to the caller.
///
/// Reads and writes have no timeout; a peer that stops sending or receiving
/// holds the connection until the caller gives up on it.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    writer: MessageWriter<W>,
    config: Arc<ServeConfig>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, config: Arc<ServeConfig>) -> Self {
        let decoder = RequestDecoder::new(config.max_line_bytes);
        Self {
            framed_read: FramedRead::with_capacity(reader, decoder, READ_BUFFER_SIZE),
            writer: MessageWriter::with_capacity(writer, WRITE_BUFFER_SIZE, config.max_response_bytes),
            config,
        }
    }

    pub fn config(&self) -> &ServeConfig {
        &self.config
    }

    /// Reads one request and writes its response.
    ///
    /// Returns `Ok(())` once a response was written, including error pages for
    /// unsupported methods, unknown targets, missing or unreadable files and
    /// failed uploads. A request that can't be framed (bad header, bad or
    /// missing length, truncated body) is answered with a 4xx page and then
    /// reported as [`HttpError::RequestError`]. If the peer closes before
    /// sending a request line nothing is written.
    pub async fn process(mut self) -> Result<(), HttpError> {
        let line = match self.read_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("cant read request line, connection closed by peer");
                return Ok(());
            }
            Err(e) => return self.reject(e).await,
        };

        let request_line = RequestLine::parse(&line);
        info!(
            method = request_line.method(),
            target = request_line.target(),
            version = request_line.version(),
            "receive request"
        );

        if !request_line.is_supported_method() {
            return self
                .send_error(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "Method Not Allowed",
                    "Tiny does not implement this method",
                    request_line.method_label(),
                )
                .await;
        }

        let target = match Target::parse(request_line.target()) {
            Ok(target) => target,
            Err(e) => {
                debug!(cause = %e, "can't classify request target");
                return self.send_bad_uri(request_line.target()).await;
            }
        };

        match target.endpoint() {
            Endpoint::File if request_line.is_method(&Method::GET) => serve_static_file(&mut self, target.name()).await,
            Endpoint::Upload if request_line.is_method(&Method::POST) => serve_upload(&mut self, target.name()).await,
            endpoint => {
                debug!(%endpoint, method = request_line.method(), "method not accepted by endpoint");
                self.send_bad_uri(request_line.target()).await
            }
        }
    }

    /// Next head line, `None` once the peer has closed.
    pub(crate) async fn read_line(&mut self) -> Result<Option<Bytes>, ParseError> {
        match self.framed_read.next().await {
            Some(Ok(Message::Line(line))) => Ok(Some(line)),
            Some(Ok(Message::Body(_))) => Err(ParseError::invalid_body("receive body while reading request head")),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Consumes header lines up to and including the blank line.
    pub(crate) async fn read_header_meta(&mut self) -> Result<HeaderMeta, ParseError> {
        let mut meta = HeaderMeta::new();
        loop {
            let line = self
                .read_line()
                .await?
                .ok_or_else(|| ParseError::invalid_header("connection closed before end of headers"))?;
            if line.is_empty() {
                return Ok(meta);
            }

            debug!(header = %String::from_utf8_lossy(&line), "receive header");
            meta.apply_line(&line)?;
        }
    }

    /// Reads exactly `length` body bytes; the caller has bounded `length`.
    pub(crate) async fn read_body(&mut self, length: usize) -> Result<Bytes, ParseError> {
        self.framed_read.decoder_mut().expect_body(length);

        match self.framed_read.next().await {
            Some(Ok(Message::Body(body))) => Ok(body),
            Some(Ok(Message::Line(_))) => Err(ParseError::invalid_body("receive head line while reading body")),
            Some(Err(e)) => Err(e),
            None => Err(ParseError::invalid_body(format!("connection closed before {length} body bytes"))),
        }
    }

    pub(crate) async fn send_error(
        &mut self,
        status: StatusCode,
        short_message: &str,
        long_message: &str,
        cause: &str,
    ) -> Result<(), HttpError> {
        info!(status = status.as_u16(), cause, "send error response");
        let page = ErrorPage::new(status, short_message, long_message, cause);
        Ok(self.writer.send_error(&page).await?)
    }

    pub(crate) async fn send_json(&mut self, json: Bytes) -> Result<(), HttpError> {
        Ok(self.writer.send_json(&self.config.server_name, json).await?)
    }

    pub(crate) async fn send_file(&mut self, head: ResponseHead, body: &[u8]) -> Result<(), HttpError> {
        Ok(self.writer.send_file(head, body).await?)
    }

    /// Answers a request that couldn't be framed, then reports the parse error.
    pub(crate) async fn reject(&mut self, e: ParseError) -> Result<(), HttpError> {
        if e.is_io() {
            error!(cause = %e, "can't read request");
            return Err(e.into());
        }

        warn!(cause = %e, "reject malformed request");
        let (status, short_message) = match e {
            ParseError::MissingContentLength => (StatusCode::LENGTH_REQUIRED, "Length Required"),
            ParseError::TooLargeBody { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large"),
            _ => (StatusCode::BAD_REQUEST, "Bad Request"),
        };
        self.send_error(status, short_message, "Tiny couldn't read the request", &e.to_string()).await?;
        Err(e.into())
    }

    async fn send_bad_uri(&mut self, uri: &str) -> Result<(), HttpError> {
        self.send_error(StatusCode::BAD_REQUEST, "Bad Request", "Tiny couldn't parse the uri", uri).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PublicUrl;
    use indoc::indoc;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    struct Response {
        head: String,
        body: Vec<u8>,
    }

    impl Response {
        fn parse(raw: &[u8]) -> Self {
            let split = raw.windows(4).position(|w| w == b"\r\n\r\n").expect("response has no head terminator");
            Self { head: String::from_utf8(raw[..split + 4].to_vec()).unwrap(), body: raw[split + 4..].to_vec() }
        }

        fn status_line(&self) -> &str {
            self.head.lines().next().unwrap()
        }

        fn body_str(&self) -> &str {
            std::str::from_utf8(&self.body).unwrap()
        }
    }

    fn serve_root() -> (TempDir, Arc<ServeConfig>) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServeConfig::default().with_root_dir(dir.path());
        (dir, Arc::new(config))
    }

    async fn round_trip(config: &Arc<ServeConfig>, request: &[u8]) -> (Result<(), HttpError>, Vec<u8>) {
        let mut out = Vec::new();
        let result = HttpConnection::new(request, &mut out, Arc::clone(config)).process().await;
        (result, out)
    }

    fn upload_request(boundary: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\n\
             Content-Type: image/png\r\n\
             \r\n"
        )
        .into_bytes();
        body.extend_from_slice(payload);

        let mut request = format!(
            "POST /upload/cat.png HTTP/1.0\r\n\
             Host: 127.0.0.1:8080\r\n\
             Content-Type: multipart/form-data; boundary={boundary}\r\n\
             Content-Length: {}\r\n\
             \r\n",
            body.len()
        )
        .into_bytes();
        request.extend_from_slice(&body);
        request
    }

    fn uploaded_name(response: &Response) -> String {
        let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(json["status"], "success");
        let url = json["url"].as_str().unwrap();
        url.rsplit('/').next().unwrap().to_owned()
    }

    #[tokio::test]
    async fn serve_html_file() {
        let (dir, config) = serve_root();
        let content = b"<html><body>fifty bytes of html content!</body></html>";
        let content = &content[..50];
        std::fs::write(dir.path().join("index.html"), content).unwrap();

        let (result, out) = round_trip(&config, b"GET /file/index.html HTTP/1.0\r\n\r\n").await;

        result.unwrap();
        let response = Response::parse(&out);
        assert_eq!(
            response.head,
            "HTTP/1.0 200 OK\r\n\
             Server: Tiny Web Server\r\n\
             Connection: close\r\n\
             Content-length: 50\r\n\
             Content-type: text/html\r\n\
             \r\n"
        );
        assert_eq!(response.body, content);
    }

    #[tokio::test]
    async fn serve_file_with_headers_from_curl() {
        let (dir, config) = serve_root();
        std::fs::write(dir.path().join("notes.txt"), b"plain\n").unwrap();

        let request = indoc! {"
            get /file/notes.txt HTTP/1.1
            Host: 127.0.0.1:8080
            User-Agent: curl/7.79.1
            Accept: */*

            "};
        let (result, out) = round_trip(&config, request.as_bytes()).await;

        result.unwrap();
        let response = Response::parse(&out);
        assert_eq!(response.status_line(), "HTTP/1.0 200 OK");
        assert!(response.head.contains("Content-type: text/plain\r\n"));
        assert_eq!(response.body, b"plain\n");
    }

    #[tokio::test]
    async fn serve_empty_file() {
        let (dir, config) = serve_root();
        std::fs::write(dir.path().join("empty.gif"), b"").unwrap();

        let (result, out) = round_trip(&config, b"GET /file/empty.gif HTTP/1.0\r\n\r\n").await;

        result.unwrap();
        let response = Response::parse(&out);
        assert!(response.head.contains("Content-length: 0\r\n"));
        assert!(response.head.contains("Content-type: image/gif\r\n"));
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn serving_twice_is_identical() {
        let (dir, config) = serve_root();
        std::fs::write(dir.path().join("logo.png"), b"\x89PNG\r\n\x1a\nrest").unwrap();
        let request = b"GET /file/logo.png HTTP/1.0\r\n\r\n";

        let (_, first) = round_trip(&config, request).await;
        let (_, second) = round_trip(&config, request).await;

        assert_eq!(first, second);
        assert_eq!(Response::parse(&first).body, b"\x89PNG\r\n\x1a\nrest");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let (_dir, config) = serve_root();

        let (result, out) = round_trip(&config, b"GET /file/does-not-exist HTTP/1.0\r\n\r\n").await;

        result.unwrap();
        let response = Response::parse(&out);
        assert_eq!(response.status_line(), "HTTP/1.0 404 Not Found");
        assert!(response.head.contains("Content-type: text/html\r\n"));
        assert!(response.body_str().contains("No such file: does-not-exist"));
        assert!(response.head.contains(&format!("Content-length: {}\r\n", response.body.len())));
    }

    #[tokio::test]
    async fn unreadable_file_is_403() {
        let (dir, config) = serve_root();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, b"secret").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o200)).unwrap();

        let (result, out) = round_trip(&config, b"GET /file/secret.txt HTTP/1.0\r\n\r\n").await;

        result.unwrap();
        let response = Response::parse(&out);
        assert_eq!(response.status_line(), "HTTP/1.0 403 Forbidden");
        assert!(response.body_str().contains("Tiny couldn't read the file: secret.txt"));
    }

    #[tokio::test]
    async fn directory_is_403() {
        let (dir, config) = serve_root();
        std::fs::create_dir(dir.path().join("assets")).unwrap();

        let (_, out) = round_trip(&config, b"GET /file/assets HTTP/1.0\r\n\r\n").await;

        assert_eq!(Response::parse(&out).status_line(), "HTTP/1.0 403 Forbidden");
    }

    #[tokio::test]
    async fn unknown_target_is_400() {
        let (_dir, config) = serve_root();

        let (result, out) = round_trip(&config, b"GET /unknown HTTP/1.0\r\n\r\n").await;

        result.unwrap();
        let response = Response::parse(&out);
        assert_eq!(response.status_line(), "HTTP/1.0 400 Bad Request");
        assert!(response.body_str().contains("couldn't parse the uri"));
        assert!(response.body_str().contains("400: Bad Request"));
    }

    #[tokio::test]
    async fn endpoint_method_mismatch_is_400() {
        let (_dir, config) = serve_root();

        let (_, out) = round_trip(&config, b"GET /upload/x HTTP/1.0\r\n\r\n").await;
        assert_eq!(Response::parse(&out).status_line(), "HTTP/1.0 400 Bad Request");

        let (_, out) = round_trip(&config, b"POST /file/x HTTP/1.0\r\nContent-Length: 0\r\n\r\n").await;
        assert_eq!(Response::parse(&out).status_line(), "HTTP/1.0 400 Bad Request");
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let (_dir, config) = serve_root();

        for request in [&b"PUT /file/x HTTP/1.0\r\n\r\n"[..], b"DELETE /unknown HTTP/1.0\r\n\r\n", b"\r\n"] {
            let (result, out) = round_trip(&config, request).await;

            result.unwrap();
            let response = Response::parse(&out);
            assert_eq!(response.status_line(), "HTTP/1.0 405 Method Not Allowed");
            assert!(response.body_str().contains("Tiny does not implement this method"));
        }
    }

    #[tokio::test]
    async fn closed_before_request_line() {
        let (_dir, config) = serve_root();

        let (result, out) = round_trip(&config, b"").await;

        result.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn too_long_request_line() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(ServeConfig { max_line_bytes: 64, ..ServeConfig::default().with_root_dir(dir.path()) });
        let request = format!("GET /file/{} HTTP/1.0\r\n\r\n", "a".repeat(100));

        let (result, out) = round_trip(&config, request.as_bytes()).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::TooLargeLine { .. } })));
        assert_eq!(Response::parse(&out).status_line(), "HTTP/1.0 400 Bad Request");
    }

    #[tokio::test]
    async fn malformed_header_on_get() {
        let (dir, config) = serve_root();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let (result, out) = round_trip(&config, b"GET /file/a.txt HTTP/1.0\r\nContent-Length: x\r\n\r\n").await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::InvalidContentLength { .. } })));
        assert_eq!(Response::parse(&out).status_line(), "HTTP/1.0 400 Bad Request");
    }

    #[tokio::test]
    async fn upload_then_fetch() {
        let (dir, config) = serve_root();
        let payload: Vec<u8> = (0..=255u8).chain(b"\r\n\n\0tail".iter().copied()).collect();

        let (result, out) = round_trip(&config, &upload_request("----tinyboundary", &payload)).await;

        result.unwrap();
        let response = Response::parse(&out);
        assert_eq!(response.status_line(), "HTTP/1.0 200 OK");
        assert!(response.head.contains("Server: Tiny Web Server\r\n"));
        assert!(response.head.contains("Connection: close\r\n"));
        assert!(response.head.contains("Content-type: application/json\r\n"));
        assert!(response.head.contains(&format!("Content-length: {}\r\n", response.body.len())));

        let name = uploaded_name(&response);
        assert!(name.starts_with("tiny") && name.ends_with(".png"));
        let json: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(json["url"], format!("http://127.0.0.1:8080/file/{name}"));

        let stored = dir.path().join(&name);
        assert_eq!(std::fs::read(&stored).unwrap(), payload);
        assert_eq!(std::fs::metadata(&stored).unwrap().permissions().mode() & 0o777, 0o600);

        let (result, out) = round_trip(&config, format!("GET /file/{name} HTTP/1.0\r\n\r\n").as_bytes()).await;
        result.unwrap();
        let response = Response::parse(&out);
        assert!(response.head.contains("Content-type: image/png\r\n"));
        assert_eq!(response.body, payload);
    }

    #[tokio::test]
    async fn upload_url_uses_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let public_url = PublicUrl::new("https", "files.example.com", 443);
        let config = Arc::new(ServeConfig::default().with_root_dir(dir.path()).with_public_url(public_url));

        let (_, out) = round_trip(&config, &upload_request("b", b"x")).await;

        let json: serde_json::Value = serde_json::from_slice(&Response::parse(&out).body).unwrap();
        assert!(json["url"].as_str().unwrap().starts_with("https://files.example.com:443/file/tiny"));
    }

    #[tokio::test]
    async fn upload_keeps_closing_boundary() {
        let (dir, config) = serve_root();
        let payload = b"data\r\n--b--\r\n";

        let (_, out) = round_trip(&config, &upload_request("b", payload)).await;

        let name = uploaded_name(&Response::parse(&out));
        assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), payload);
    }

    #[tokio::test]
    async fn upload_without_length_is_411() {
        let (dir, config) = serve_root();

        let (result, out) = round_trip(&config, b"POST /upload/a.png HTTP/1.0\r\n\r\n").await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::MissingContentLength })));
        assert_eq!(Response::parse(&out).status_line(), "HTTP/1.0 411 Length Required");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_413() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(ServeConfig::default().with_root_dir(dir.path()).with_max_body_bytes(16));

        let (result, out) = round_trip(&config, &upload_request("b", &[b'x'; 64])).await;

        assert!(matches!(
            result,
            Err(HttpError::RequestError { source: ParseError::TooLargeBody { max_size: 16, .. } })
        ));
        let response = Response::parse(&out);
        assert_eq!(response.status_line(), "HTTP/1.0 413 Payload Too Large");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn malformed_length_on_upload() {
        let (dir, config) = serve_root();
        let request = b"POST /upload/a.png HTTP/1.0\r\nContent-Length: 12abc\r\n\r\n--b\r\n\r\n\r\n\r\npayload";

        let (result, out) = round_trip(&config, request).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::InvalidContentLength { .. } })));
        let response = Response::parse(&out);
        assert_eq!(response.status_line(), "HTTP/1.0 400 Bad Request");
        assert!(response.body_str().contains("Tiny couldn't read the request"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn truncated_upload_body() {
        let (_dir, config) = serve_root();
        let request = b"POST /upload/a HTTP/1.0\r\nContent-Length: 100\r\n\r\nshort";

        let (result, out) = round_trip(&config, request).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::InvalidBody { .. } })));
        assert_eq!(Response::parse(&out).status_line(), "HTTP/1.0 400 Bad Request");
    }

    #[tokio::test]
    async fn upload_with_short_preamble() {
        let (dir, config) = serve_root();
        let body = "--b\r\nContent-Disposition: form-data\r\n";
        let request = format!("POST /upload/a HTTP/1.0\r\nContent-Length: {}\r\n\r\n{body}", body.len());

        let (result, out) = round_trip(&config, request.as_bytes()).await;

        assert!(matches!(result, Err(HttpError::RequestError { source: ParseError::InvalidBody { .. } })));
        assert_eq!(Response::parse(&out).status_line(), "HTTP/1.0 400 Bad Request");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn upload_into_missing_root_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(ServeConfig::default().with_root_dir(dir.path().join("gone")));

        let (result, out) = round_trip(&config, &upload_request("b", b"x")).await;

        result.unwrap();
        let response = Response::parse(&out);
        assert_eq!(response.status_line(), "HTTP/1.0 500 Internal Server Error");
        assert!(response.body_str().contains("Tiny couldn't generate unique file name: cat.png"));
    }

    #[tokio::test]
    async fn body_after_head_is_not_consumed_by_get() {
        let (dir, config) = serve_root();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();

        // bytes after the blank line are left unread
        let (result, out) = round_trip(&config, b"GET /file/a.txt HTTP/1.0\r\n\r\ntrailing junk").await;

        result.unwrap();
        assert_eq!(Response::parse(&out).body, b"a");
    }

}
