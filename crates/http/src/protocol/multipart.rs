//! Extraction of the single file part of an upload body.
//!
//! This is not a general multipart parser. Uploads are expected to carry one
//! file part laid out as
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="file"; filename="a.png"\r\n
//! Content-Type: image/png\r\n
//! \r\n
//! <file bytes...>
//! ```
//!
//! and the payload is whatever follows the fourth line terminator. The closing
//! `--<boundary>--` footer is *not* removed, and a part with a different number
//! of header lines yields a corrupted payload. When the request declared a
//! boundary, a mismatching first line is logged but splitting still uses the
//! fixed line count.

use bytes::Bytes;
use tracing::{trace, warn};

use crate::protocol::ParseError;

/// Number of lines before the file payload: boundary, disposition, type, blank.
pub const PREAMBLE_LINES: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SplitState {
    /// Skipping preamble line `n` (0-based)
    Preamble(usize),
    /// Everything from here on is payload
    Payload,
}

/// Locates the file payload inside a fully buffered upload body.
#[derive(Debug)]
pub struct MultipartSplitter<'a> {
    boundary: Option<&'a str>,
    state: SplitState,
}

impl<'a> MultipartSplitter<'a> {
    /// `boundary` is the token declared by the request's `Content-Type`, if any.
    pub fn new(boundary: Option<&'a str>) -> Self {
        Self { boundary, state: SplitState::Preamble(0) }
    }

    /// Consumes the preamble and returns the payload as a view into `body`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidBody`] if the body ends before
    /// [`PREAMBLE_LINES`] line terminators were seen.
    pub fn split(mut self, body: Bytes) -> Result<Bytes, ParseError> {
        let mut offset = 0;

        while let SplitState::Preamble(index) = self.state {
            let end = body[offset..].iter().position(|b| *b == b'\n').ok_or_else(|| {
                ParseError::invalid_body(format!("multipart preamble ended after {index} of {PREAMBLE_LINES} lines"))
            })?;

            let line = &body[offset..offset + end];
            if index == 0 {
                self.check_boundary_line(line);
            }
            trace!(index, line = %String::from_utf8_lossy(line).trim_end(), "skip multipart preamble line");

            offset += end + 1;
            self.state =
                if index + 1 == PREAMBLE_LINES { SplitState::Payload } else { SplitState::Preamble(index + 1) };
        }

        Ok(body.slice(offset..))
    }

    fn check_boundary_line(&self, line: &[u8]) {
        let Some(boundary) = self.boundary else {
            return;
        };

        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let matches = line.strip_prefix(b"--").is_some_and(|token| token == boundary.as_bytes());
        if !matches {
            warn!(
                boundary,
                line = %String::from_utf8_lossy(line),
                "first multipart line is not the declared boundary, payload may be corrupted"
            );
        }
    }
}
