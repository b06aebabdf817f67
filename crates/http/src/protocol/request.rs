//! HTTP request line handling.
//!
//! The request line is the only part of the head this server reads in full.
//! Parsing is deliberately lenient: it never fails, missing tokens become empty
//! strings and the method check happens afterwards so that any unknown or empty
//! method is answered with `405 Method Not Allowed`.

use http::Method;

/// The first line of a request: `METHOD SP TARGET SP VERSION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    target: String,
    version: String,
}

impl RequestLine {
    /// Splits a raw request line on ASCII whitespace.
    ///
    /// Invalid UTF-8 is replaced lossily, extra tokens after the version are ignored.
    pub fn parse(line: &[u8]) -> Self {
        let line = String::from_utf8_lossy(line);
        let mut tokens = line.split_ascii_whitespace();

        let mut next_token = || tokens.next().map(str::to_owned).unwrap_or_default();
        let method = next_token();
        let target = next_token();
        let version = next_token();

        Self { method, target, version }
    }

    /// Returns the method token as received.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the request target (the URI string).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the protocol version token, empty if the client omitted it.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// ASCII case-insensitive method comparison.
    pub fn is_method(&self, method: &Method) -> bool {
        self.method.eq_ignore_ascii_case(method.as_str())
    }

    /// Only `GET` and `POST` are implemented.
    pub fn is_supported_method(&self) -> bool {
        self.is_method(&Method::GET) || self.is_method(&Method::POST)
    }

    /// The method token for error pages, where an empty method still needs a visible cause.
    pub fn method_label(&self) -> &str {
        if self.method.is_empty() { "(none)" } else { &self.method }
    }
}
