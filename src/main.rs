//! viewsync mock directory service.
//!
//! Serves the user-directory wire contract over an in-memory store so the
//! synchronization core has something real to talk to during development.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use viewsync::config::{Cli, Config};
use viewsync::server::api::{build_router, AppState};
use viewsync::transport::mock::MockDirectory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "viewsync=debug,tower_http=debug"
    } else {
        "viewsync=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("viewsync v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?;
    let config = Arc::new(config);

    info!(
        user_count = config.data.user_count,
        read_delay_ms = config.data.read_delay_ms,
        write_delay_ms = config.data.write_delay_ms,
        "Configuration loaded"
    );

    // Seed the mock directory.
    let directory = Arc::new(MockDirectory::new(&config.data));
    info!(users = directory.user_count().await, "Directory seeded");

    // Build application state.
    let state = Arc::new(AppState {
        directory,
        config: config.clone(),
        start_time: Instant::now(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = cli.listen;
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
