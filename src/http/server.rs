//! HTTP Server
//!
//! Binds the listener and serves the router until Ctrl+C.

use std::sync::Arc;

use crate::error::Result;
use crate::service::CarService;

use super::router;

/// Serve `service` at `addr` (e.g. `"127.0.0.1:8080"`) until Ctrl+C
pub async fn serve(service: Arc<CarService>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, initiating shutdown..."),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
