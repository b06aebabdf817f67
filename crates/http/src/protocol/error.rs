use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeLine { current_size: usize, max_size: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http uri: {uri}")]
    InvalidUri { uri: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("missing content-length header")]
    MissingContentLength,

    #[error("body size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeBody { current_size: usize, max_size: usize },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_line(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeLine { current_size, max_size }
    }

    pub fn too_large_body(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeBody { current_size, max_size }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_uri<S: ToString>(uri: S) -> Self {
        Self::InvalidUri { uri: uri.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    /// Whether the peer's stream itself failed, in which case no response can be sent.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("response size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeResponse { current_size: usize, max_size: usize },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn too_large_response(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeResponse { current_size, max_size }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }
}
