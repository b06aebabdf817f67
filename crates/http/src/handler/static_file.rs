//! Static file serving.
//!
//! A name is resolved against the configured root and served only if it is a
//! regular file with the owner-read bit set. The body is written from a
//! read-only memory map of the file, so file bytes are never copied into a
//! userspace buffer of ours.

use std::io;
use std::ops::Deref;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use http::StatusCode;
use memmap2::Mmap;
use mime::Mime;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::connection::HttpConnection;
use crate::protocol::response::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use crate::protocol::{HttpError, ResponseHead};

/// Owner read permission bit of a unix file mode
const OWNER_READ: u32 = 0o400;

/// Extension markers checked in order; the first one contained in the name wins.
const CONTENT_TYPES: [(&str, Mime); 4] =
    [(".html", mime::TEXT_HTML), (".gif", mime::IMAGE_GIF), (".png", mime::IMAGE_PNG), (".jpg", mime::IMAGE_JPEG)];

/// Content type of `name` by extension marker, `text/plain` when none matches.
///
/// The test is a substring test, not a suffix test: `a.html.gif` is `text/html`
/// because `.html` is checked first.
pub fn content_type_for(name: &str) -> Mime {
    CONTENT_TYPES
        .iter()
        .find(|(marker, _)| name.contains(marker))
        .map_or(mime::TEXT_PLAIN, |(_, mime)| mime.clone())
}

pub(crate) async fn serve_static_file<R, W>(connection: &mut HttpConnection<R, W>, name: &str) -> Result<(), HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Err(e) = connection.read_header_meta().await {
        return connection.reject(e).await;
    }

    let path = connection.config().root_dir().join(name);
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            info!(path = %path.display(), cause = %e, "can't stat file");
            return connection.send_error(StatusCode::NOT_FOUND, "Not Found", "No such file", name).await;
        }
    };

    if !metadata.is_file() || metadata.permissions().mode() & OWNER_READ == 0 {
        warn!(path = %path.display(), is_file = metadata.is_file(), "file is not readable");
        return connection.send_error(StatusCode::FORBIDDEN, "Forbidden", "Tiny couldn't read the file", name).await;
    }

    let mapped = match MappedFile::open(&path).await {
        Ok(mapped) => mapped,
        Err(e) => {
            warn!(path = %path.display(), cause = %e, "can't map file");
            return connection.send_error(StatusCode::FORBIDDEN, "Forbidden", "Tiny couldn't read the file", name).await;
        }
    };

    let head = ResponseHead::ok()
        .header(SERVER, &connection.config().server_name)
        .header(CONNECTION, "close")
        .header(CONTENT_LENGTH, mapped.len())
        .header(CONTENT_TYPE, content_type_for(name));

    let result = connection.send_file(head, &mapped).await;
    drop(mapped);
    result
}

/// A read-only view of a whole file, unmapped when dropped.
enum MappedFile {
    /// Zero-length files can't be mapped
    Empty,
    Mapped(Mmap),
}

impl MappedFile {
    async fn open(path: &Path) -> io::Result<Self> {
        let file = tokio::fs::File::open(path).await?.into_std().await;
        if file.metadata()?.len() == 0 {
            return Ok(Self::Empty);
        }

        // SAFETY: the map is read-only and never outlives the response write. A
        // concurrent truncation of the file by another process is not guarded
        // against and can fault the reading thread.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self::Mapped(map))
    }
}

impl Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            MappedFile::Empty => &[],
            MappedFile::Mapped(map) => map.as_ref(),
        }
    }
}
