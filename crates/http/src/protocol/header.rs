//! Request header metadata.
//!
//! Only two headers matter to this server, so instead of building a full header
//! map every header line is offered to [`HeaderMeta::apply_line`], which keeps
//! `Content-Type` and `Content-Length` and drops the rest. Matching is a
//! case-sensitive prefix test, so `content-length: 10` is ignored.

use crate::protocol::ParseError;

const CONTENT_TYPE_PREFIX: &[u8] = b"Content-Type:";
const CONTENT_LENGTH_PREFIX: &[u8] = b"Content-Length:";

const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const BOUNDARY_PARAM: &str = "boundary=";

/// The `Content-Type` and `Content-Length` of one request.
///
/// Built fresh for every request and dropped once the handler that read it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMeta {
    content_type: Option<String>,
    content_length: Option<usize>,
}

impl HeaderMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspects one header line (terminator already stripped).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidHeader`] for a `Content-Type` with no value and
    /// [`ParseError::InvalidContentLength`] when the length is not a non-negative integer.
    pub fn apply_line(&mut self, line: &[u8]) -> Result<(), ParseError> {
        if let Some(value) = line.strip_prefix(CONTENT_TYPE_PREFIX) {
            let value = header_value(value).ok_or_else(|| ParseError::invalid_header("Content-Type has no value"))?;
            self.content_type = Some(value.to_owned());
        } else if let Some(value) = line.strip_prefix(CONTENT_LENGTH_PREFIX) {
            let value = header_value(value).ok_or_else(|| ParseError::invalid_content_length("value is empty"))?;
            let length = value.parse::<usize>().map_err(|e| {
                ParseError::invalid_content_length(format!("value {value} is not a non-negative integer: {e}"))
            })?;
            self.content_length = Some(length);
        }
        Ok(())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// The multipart boundary token declared by `Content-Type`, if any.
    ///
    /// Accepts `multipart/form-data; boundary=<token>` where the token ends at `;`
    /// or whitespace and may be quoted.
    pub fn boundary(&self) -> Option<&str> {
        let content_type = self.content_type.as_deref()?;
        let (mime, params) = content_type.split_once(';')?;
        if !mime.trim().eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
            return None;
        }

        params.split(';').map(str::trim).find_map(|param| {
            let token = param.strip_prefix(BOUNDARY_PARAM)?;
            let token = token.split_ascii_whitespace().next()?;
            let token = token.trim_matches('"');
            (!token.is_empty()).then_some(token)
        })
    }
}

fn header_value(raw: &[u8]) -> Option<&str> {
    let value = std::str::from_utf8(raw).ok()?.trim();
    (!value.is_empty()).then_some(value)
}
