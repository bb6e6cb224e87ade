use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use config::Config;

const DEFAULT_LISTEN_ADDRESS: ([u8; 4], u16) = ([127, 0, 0, 1], 7180);

#[derive(Debug, Parser)]
#[command(name = "atrium", about = "Session-aware front layer for a cookie-authenticated backend API")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "ATRIUM_CONFIG", default_value = "atrium.toml")]
    pub config: PathBuf,

    /// Override the configured listen address.
    #[arg(short, long, env = "ATRIUM_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,

    /// Log filter, e.g. `info` or `server=debug,session_api=debug`.
    #[arg(long, env = "ATRIUM_LOG", default_value = "info")]
    pub log_filter: String,
}

impl Args {
    /// CLI override wins, then the config file, then the loopback default.
    pub fn resolve_listen_address(&self, config: &Config) -> SocketAddr {
        self.listen_address
            .or(config.server.listen_address)
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_LISTEN_ADDRESS))
    }
}
