//! HTTP response heads and the HTML error page.
//!
//! Responses are always `HTTP/1.0`. Header names are written exactly as given
//! (`Content-type`, `Content-length`, ...) so a [`ResponseHead`] keeps an ordered
//! list of name/value pairs instead of a normalizing header map.

use std::borrow::Cow;

use http::StatusCode;

pub const SERVER: &str = "Server";
pub const CONNECTION: &str = "Connection";
pub const CONTENT_LENGTH: &str = "Content-length";
pub const CONTENT_TYPE: &str = "Content-type";

/// Status line and headers of a response, in write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusCode,
    reason: Cow<'static, str>,
    headers: Vec<(&'static str, String)>,
}

impl ResponseHead {
    /// A head with a caller supplied reason phrase.
    pub fn new(status: StatusCode, reason: impl Into<Cow<'static, str>>) -> Self {
        Self { status, reason: reason.into(), headers: Vec::with_capacity(4) }
    }

    /// `200 OK`
    pub fn ok() -> Self {
        Self::new(StatusCode::OK, "OK")
    }

    /// Appends a header; duplicates are written as given.
    pub fn header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.headers.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

/// The small HTML document sent for every error status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage<'a> {
    status: StatusCode,
    short_message: &'a str,
    long_message: &'a str,
    cause: &'a str,
}

impl<'a> ErrorPage<'a> {
    /// `cause` is the offending method, URI or filename; it is HTML-escaped when rendered.
    pub fn new(status: StatusCode, short_message: &'a str, long_message: &'a str, cause: &'a str) -> Self {
        Self { status, short_message, long_message, cause }
    }

    pub fn render(&self) -> String {
        let mut body = String::with_capacity(160 + self.cause.len());
        body.push_str("<html><title>Tiny Error</title>");
        body.push_str("<body bgcolor=\"ffffff\">\r\n");
        body.push_str(&format!("{}: {}\r\n", self.status.as_str(), self.short_message));
        body.push_str(&format!("<p>{}: {}\r\n", self.long_message, escape_html(self.cause)));
        body.push_str("<hr><em>The Tiny Web server</em>\r\n");
        body
    }

    /// Head for a body of `content_length` bytes.
    pub fn head(&self, content_length: usize) -> ResponseHead {
        ResponseHead::new(self.status, self.short_message.to_owned())
            .header(CONTENT_TYPE, mime::TEXT_HTML)
            .header(CONTENT_LENGTH, content_length)
    }
}

fn escape_html(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(raw);
    }

    let mut escaped = String::with_capacity(raw.len() + 16);
    for c in raw.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_page() {
        let page = ErrorPage::new(StatusCode::BAD_REQUEST, "Bad Request", "Tiny couldn't parse the uri", "/unknown");

        assert_eq!(
            page.render(),
            "<html><title>Tiny Error</title><body bgcolor=\"ffffff\">\r\n\
             400: Bad Request\r\n\
             <p>Tiny couldn't parse the uri: /unknown\r\n\
             <hr><em>The Tiny Web server</em>\r\n"
        );
    }

    #[test]
    fn cause_is_escaped() {
        let page = ErrorPage::new(StatusCode::NOT_FOUND, "Not Found", "No such file", "<script>&\"'");

        let body = page.render();

        assert!(body.contains("No such file: &lt;script&gt;&amp;&quot;&#39;\r\n"));
        assert!(!body.contains("<script>"));
    }

    #[test]
    fn error_head_order() {
        let page = ErrorPage::new(StatusCode::FORBIDDEN, "Forbidden", "Tiny couldn't read the file", "x");
        let head = page.head(42);

        assert_eq!(head.status(), StatusCode::FORBIDDEN);
        assert_eq!(head.reason(), "Forbidden");
        assert_eq!(head.headers().collect::<Vec<_>>(), vec![(CONTENT_TYPE, "text/html"), (CONTENT_LENGTH, "42")]);
    }
}
