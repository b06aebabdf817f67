//! Server settings: where to listen plus the request core's [`ServeConfig`].
//!
//! Loaded from an optional JSON file. Every key may be omitted:
//!
//! ```json
//! {
//!   "listen": "0.0.0.0:8080",
//!   "root_dir": "/srv/tiny",
//!   "max_body_bytes": 1048576,
//!   "public_url": { "scheme": "http", "host": "example.com", "port": 8080 }
//! }
//! ```

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tinyweb_http::config::{self, ServeConfig};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    #[serde(flatten)]
    pub serve: ServeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: SocketAddr::from(([127, 0, 0, 1], 8080)), serve: ServeConfig::default() }
    }
}

impl ServerConfig {
    /// Reads and validates the file at `path`, or returns the defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
                serde_json::from_str::<Self>(&json)?
            }
            None => Self::default(),
        };

        config.serve.validate()?;
        Ok(config)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("can't read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed config: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid config: {source}")]
    Invalid {
        #[from]
        source: config::ConfigError,
    },
}

impl ConfigError {
    fn read(path: &Path, source: io::Error) -> Self {
        Self::Read { path: path.to_path_buf(), source }
    }
}
