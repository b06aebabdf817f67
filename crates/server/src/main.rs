use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

use crate::config::ServerConfig;
use crate::server::Server;

mod config;
mod server;

// usage: tinyweb [config.json]
#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match ServerConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(cause = %e, "can't load config");
            return ExitCode::FAILURE;
        }
    };

    match Server::new(config).start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, "bind server error");
            ExitCode::FAILURE
        }
    }
}
