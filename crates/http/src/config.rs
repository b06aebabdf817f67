//! Collaborator-supplied constants for the request core.
//!
//! Every field has a default, so an empty JSON object is a valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Longest accepted request or header line, terminator included
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024;

/// Largest accepted upload body
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Largest buffered (error page or JSON) response body
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Room an error page needs besides its cause
const ERROR_PAGE_OVERHEAD: usize = 512;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Directory static names are resolved against and uploads are stored in
    pub root_dir: PathBuf,
    /// Value of the `Server` response header
    pub server_name: String,
    /// Prefix of generated upload names, followed by six random characters
    pub file_prefix: String,
    pub max_line_bytes: usize,
    pub max_body_bytes: usize,
    pub max_response_bytes: usize,
    /// Where clients reach this server, used to build upload URLs
    pub public_url: PublicUrl,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            server_name: "Tiny Web Server".to_owned(),
            file_prefix: "tiny".to_owned(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            public_url: PublicUrl::default(),
        }
    }
}

impl ServeConfig {
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_public_url(mut self, public_url: PublicUrl) -> Self {
        self.public_url = public_url;
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Checks the limits against each other.
    ///
    /// An error page echoes a cause of up to one line, so the response bound must
    /// leave room for a maximal line plus the page template.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line_bytes == 0 {
            return Err(ConfigError::ZeroLimit { name: "max_line_bytes" });
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::ZeroLimit { name: "max_response_bytes" });
        }
        // html escaping may grow a cause up to six times
        let required = self
            .max_line_bytes
            .checked_mul(6)
            .and_then(|escaped| escaped.checked_add(ERROR_PAGE_OVERHEAD))
            .ok_or(ConfigError::LineTooLarge { max_line_bytes: self.max_line_bytes })?;
        if self.max_response_bytes < required {
            return Err(ConfigError::ResponseTooSmall { max_response_bytes: self.max_response_bytes, required });
        }
        if self.file_prefix.contains('/') {
            return Err(ConfigError::InvalidPrefix { prefix: self.file_prefix.clone() });
        }
        Ok(())
    }
}

/// Scheme, host and port advertised in upload URLs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublicUrl {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Default for PublicUrl {
    fn default() -> Self {
        Self { scheme: "http".to_owned(), host: "127.0.0.1".to_owned(), port: 8080 }
    }
}

impl PublicUrl {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self { scheme: scheme.into(), host: host.into(), port }
    }

    /// `<scheme>://<host>:<port>/file/<name>`
    pub fn file_url(&self, name: &str) -> String {
        format!("{}://{}:{}/file/{}", self.scheme, self.host, self.port, name)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    ZeroLimit { name: &'static str },

    #[error("max_line_bytes {max_line_bytes} is too large to bound an error page")]
    LineTooLarge { max_line_bytes: usize },

    #[error("max_response_bytes {max_response_bytes} can't hold an error page, need at least {required}")]
    ResponseTooSmall { max_response_bytes: usize, required: usize },

    #[error("file_prefix {prefix:?} must not contain a path separator")]
    InvalidPrefix { prefix: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServeConfig::default();

        assert_eq!(config.root_dir(), Path::new("."));
        assert_eq!(config.max_line_bytes, 8192);
        assert_eq!(config.public_url.file_url("tinyAbc123.png"), "http://127.0.0.1:8080/file/tinyAbc123.png");
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ServeConfig =
            serde_json::from_str(r#"{"root_dir": "/srv/tiny", "public_url": {"host": "example.com"}}"#).unwrap();

        assert_eq!(config.root_dir(), Path::new("/srv/tiny"));
        assert_eq!(config.server_name, "Tiny Web Server");
        assert_eq!(config.public_url, PublicUrl::new("http", "example.com", 8080));
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn validate_limits() {
        let config = ServeConfig { max_line_bytes: 1024, max_response_bytes: 4096, ..ServeConfig::default() };
        assert!(config.validate().is_err());

        let config = ServeConfig { max_line_bytes: 0, ..ServeConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroLimit { name: "max_line_bytes" })));

        let config = ServeConfig { file_prefix: "../x".to_owned(), ..ServeConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPrefix { .. })));
    }

    #[test]
    fn huge_line_limit_is_rejected() {
        for max_line_bytes in [usize::MAX / 2, usize::MAX / 6] {
            let config = ServeConfig { max_line_bytes, max_response_bytes: usize::MAX, ..ServeConfig::default() };

            assert!(matches!(config.validate(), Err(ConfigError::LineTooLarge { .. })));
        }
    }
}
