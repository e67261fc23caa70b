//! Command-line entry point for map-loadtest
//!
//! ```bash
//! # Fill the map until Ctrl+C
//! map-loadtest fill --address 127.0.0.1:5701
//!
//! # Print the current size
//! map-loadtest size
//! ```

use clap::Parser;
use map_client::{ClientConfig, Connector, TcpConnector, TracingReporter};
use map_loadtest::Cli;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let cancel = setup_shutdown_handler();

    map_loadtest::run(
        cli,
        |config: &ClientConfig| -> Arc<dyn Connector> {
            Arc::new(TcpConnector::new(config.clone()))
        },
        Arc::new(TracingReporter),
        &cancel,
    )
    .await?;

    Ok(())
}

/// Cancels the returned token on Ctrl+C.
fn setup_shutdown_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt signal (Ctrl+C)");
            token.cancel();
        }
    });

    cancel
}
