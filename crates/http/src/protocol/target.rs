//! Request target classification.
//!
//! A target has the shape `/<endpoint>/<name>`. The endpoint is one or more
//! characters up to the next `/`; the name is everything after that slash and
//! must not be empty. The name is used verbatim: no percent-decoding and no
//! `..` normalization, so a name may escape the serving root.

use std::fmt;

use crate::protocol::ParseError;

/// The two endpoints this server answers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /file/<name>` serves a file
    File,
    /// `POST /upload/<name>` stores a multipart upload
    Upload,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::File => "file",
            Endpoint::Upload => "upload",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "file" => Some(Endpoint::File),
            "upload" => Some(Endpoint::Upload),
            _ => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    endpoint: Endpoint,
    name: String,
}

impl Target {
    /// Classifies `uri`, failing with [`ParseError::InvalidUri`] unless it is
    /// `/file/<name>` or `/upload/<name>` with a non-empty name.
    pub fn parse(uri: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::invalid_uri(uri);

        let rest = uri.strip_prefix('/').ok_or_else(invalid)?;
        let (segment, name) = rest.split_once('/').ok_or_else(invalid)?;
        if segment.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        let endpoint = Endpoint::from_segment(segment).ok_or_else(invalid)?;
        Ok(Self { endpoint, name: name.to_owned() })
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// The remainder after the endpoint segment.
    pub fn name(&self) -> &str {
        &self.name
    }
}
