//! Entry point for the room signaling server
//!
//! Listens on `0.0.0.0:5000` until Ctrl-C.

use room_signaling::{ServerConfig, SignalingError, SignalingServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SignalingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server = SignalingServer::new(ServerConfig::default());
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
}
