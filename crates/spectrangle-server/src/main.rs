//! Spectrangle multiplayer game server.

use spectrangle_server::server::{self, ServerState};
use spectrangle_server::ServerConfig;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!(?config, "Starting Spectrangle server...");

    let state = Arc::new(ServerState::new());

    tokio::select! {
        result = server::run_server(&config, Arc::clone(&state)) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            state.kill_all();
            Ok(())
        }
    }
}
