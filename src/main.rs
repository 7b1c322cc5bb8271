//! alumnid — alumni registration/login service.
//!
//! Reads a TOML config naming the storage backend, constructs the repository
//! and credential store explicitly (no globals), and serves the HTTP gateway.

mod config;
mod error;
mod gateway;
mod registry;
mod repo;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "alumnid", version, about = "Alumni registration/login service")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "alumnid.toml")]
    config: PathBuf,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = config::Config::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.gateway.host = host;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let repo = repo::create_repository(&config.storage)?;
    let store = Arc::new(registry::CredentialStore::new(repo));

    gateway::run_gateway(&config.gateway.host, config.gateway.port, store).await
}
