//! HTTP server exposing the login, signup and logout routes.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::oauth::HydraAdapter;

pub use routes::create_router;

/// Serve the routes until Ctrl+C.
///
/// # Errors
///
/// Returns error on bind or server failure.
pub async fn run_http(adapter: Arc<HydraAdapter>, port: u16, base_url: String) -> anyhow::Result<()> {
    let router = create_router(adapter, base_url);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("HTTP server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
