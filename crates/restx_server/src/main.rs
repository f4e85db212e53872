//! RESTx Server
//!
//! Serves the registered components over HTTP.

#![warn(missing_docs)]
#![warn(clippy::all)]

use anyhow::{Context, Result};
use clap::Parser;
use restx_component::SharedRegistry;
use restx_core::Settings;
use restx_server::{ApiServer, AppState, SampleComponent};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "restx-server")]
#[command(about = "RESTx server", long_about = None)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long, env = "RESTX_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overriding the settings
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("restx=info,tower_http=debug")),
        )
        .init();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.apply_env().context("reading RESTX_* environment")?;
    if let Some(bind) = args.bind {
        settings.listen_address = bind;
    }

    let registry = SharedRegistry::new();
    registry
        .register(Arc::new(SampleComponent::new()))
        .context("registering sample component")?;

    let server = ApiServer::new(AppState::new(settings, registry));
    server.serve().await?;

    Ok(())
}
