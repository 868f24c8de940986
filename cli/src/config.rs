//! Command-line and environment configuration for the `wrap` binary.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use thiserror::Error;
use wrap_core::Environment;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8989";
pub const DEFAULT_LOG_FILTER: &str = "wrap=info,wrap_core=info,wrap_server=info,wrap_cli=info";

#[derive(Debug, Parser)]
#[command(name = "wrap", version, about = "Serve one handler tree over HTTP or a command line")]
pub struct Args {
    /// Deployment environment.
    #[arg(long, env = "WRAP_ENV", default_value = "development", global = true)]
    pub env: Environment,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Listen for HTTP requests.
    Serve {
        #[arg(long, env = "WRAP_ADDR", default_value = DEFAULT_ADDR)]
        addr: SocketAddr,
    },
    /// Read commands from stdin and print responses to stdout.
    Repl,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

/// Load `.env` from the working directory if there is one.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}
