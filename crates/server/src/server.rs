use std::sync::Arc;

use tinyweb_http::config::ServeConfig;
use tinyweb_http::connection::HttpConnection;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::config::ServerConfig;

/// Accepts connections forever, serving each on its own task.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Binds the listen address and runs the accept loop.
    ///
    /// Only returns if the listener can't be bound.
    pub async fn start(self) -> std::io::Result<()> {
        let tcp_listener = TcpListener::bind(self.config.listen).await?;
        info!(address = %self.config.listen, root_dir = %self.config.serve.root_dir.display(), "start listening");

        let serve_config = Arc::new(self.config.serve);
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            info!(%remote_addr, "accept connection");
            tokio::spawn(serve_connection(tcp_stream, Arc::clone(&serve_config)));
        }
    }
}

async fn serve_connection(tcp_stream: TcpStream, config: Arc<ServeConfig>) {
    let (reader, mut writer) = tcp_stream.into_split();

    match HttpConnection::new(reader, &mut writer, config).process().await {
        Ok(()) => info!("finished process, connection shutdown"),
        Err(e) => error!(cause = %e, "service has error, connection shutdown"),
    }

    if let Err(e) = writer.shutdown().await {
        warn!(cause = %e, "can't shutdown connection");
    }
}
