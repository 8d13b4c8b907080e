//! api-relay
//!
//! Forwards browser POSTs to a fixed upstream REST API and answers CORS
//! preflights, so a static front end can call an API that does not send
//! cross-origin headers itself.
//!
//! # Request Flow
//!
//! ```text
//!     Browser                 ┌──────────────────────────────────────────┐
//!     ───────────────────────▶│ OPTIONS → 200 + CORS                     │
//!                             │ other non-POST → 405                     │
//!                             │ POST → resolve path → POST upstream ─────┼──▶ Upstream API
//!     ◀───────────────────────│ upstream status + body + CORS ◀──────────┼───
//!                             │ transport failure → 500 {"error": ...}   │
//!                             └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_relay::config::{load_config, validate_config, ConfigError, RelayConfig};
use api_relay::http::HttpServer;
use api_relay::lifecycle::{signals, Shutdown};
use api_relay::observability;

#[derive(Parser)]
#[command(name = "api-relay")]
#[command(about = "CORS relay for a single upstream REST API", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override upstream.base_url.
    #[arg(short, long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(upstream) = cli.upstream {
        config.upstream.base_url = upstream;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    observability::init_logging(&config.observability)?;

    tracing::info!("api-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        observability::metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
