//! Dashboard server binary.
//!
//! Loads configuration, installs logging and metrics, binds the listener
//! and serves until SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dashboard_server::config::{load_config, Overrides, ServerConfig};
use dashboard_server::lifecycle::{startup, Shutdown, StartupError};
use dashboard_server::observability::{logging, metrics};
use dashboard_server::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "dashboard-server", version, about = "Static server for the GPX/SAD dashboard")]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), &cli.overrides) {
        Ok(config) => config,
        Err(e) => {
            logging::init_tracing(&ServerConfig::default().observability);
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(StartupError::from(e).into());
        }
    };

    logging::init_tracing(&config.observability);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::warn!(
                address = %config.observability.metrics_address,
                error = %e,
                "Invalid metrics address, exporter disabled"
            ),
        }
    }

    startup::report_layout(&config);

    let address = config.listener.bind_address();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(address = %address, "Listening");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
