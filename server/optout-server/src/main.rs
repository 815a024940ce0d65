use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use config_engine::ConfigLoader;
use logger_redacted::{init_tracing, LoggerConfig};
use tracing::info;

use optout_server::{create_app, OptOutServer};

/// Patient opt-out HTTP API server
#[derive(Parser, Debug)]
#[command(name = "optout-server")]
#[command(about = "Patient opt-out HTTP API server")]
struct Args {
    /// Configuration file (YAML or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(long)]
    host: Option<String>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let mut config = loader.load().context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let logging = &config.logging;
    init_tracing(&LoggerConfig {
        log_level: if args.verbose {
            "debug".to_string()
        } else {
            logging.level.clone()
        },
        json: logging.json,
        redaction_enabled: logging.redaction_enabled,
        hash_for_correlation: logging.hash_for_correlation,
    })
    .context("Failed to initialise logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting opt-out server");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let server = OptOutServer::from_config(config)
        .await
        .context("Failed to initialise server")?;
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, "Server listening");
    info!("API documentation available at http://{addr}/docs");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
