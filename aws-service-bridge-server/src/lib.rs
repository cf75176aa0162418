//! HTTP API over the bridge services:
//! - `POST /query` runs an Athena query and returns its result set
//! - `POST /publish` publishes a message to an IoT Core topic
//! - `GET /health` liveness check
//!

mod error;
pub mod routes;
mod signal;
mod state;

use anyhow::{Context, Result};
use aws_service_bridge_core::CancellationToken;
use log::info;
use tokio::net::TcpListener;

pub use error::{ApiError, ErrorBody};
pub use signal::shutdown_signal;
pub use state::AppState;

/// Bind `host:port` and serve until `shutdown` is cancelled
pub async fn start_server(
    host: &str,
    port: u16,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let address = format!("{host}:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` is cancelled.
///
/// The token is also handed to the state, so in-flight queries are cancelled
/// on shutdown.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let local_address = listener
        .local_addr()
        .context("Failed to read the listening address")?;
    info!("HTTP API listening on http://{}", local_address);

    let app = routes::router(state.with_shutdown(shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed")?;

    info!("HTTP API stopped");
    Ok(())
}
