//! Lightweight admin HTTP listener
//!
//! Exposes `/healthz` and `/metrics` on a separate address so scrapers do not
//! share the public port.

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::metrics::encode_metrics;

async fn healthz() -> &'static str { "OK" }

/// Router served by the admin listener.
pub fn admin_router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(|| async { encode_metrics() }))
}

/// Bind `addr` and serve the admin router on the current runtime.
/// Bind failures are returned; serve failures are logged by the task.
pub async fn spawn_admin_server(addr: &str) -> anyhow::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("cannot bind admin listener {addr}: {e}"))?;
    let local = listener.local_addr()?;
    info!(service = "admin", event = "listen", addr = %local, "admin server listening");
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, admin_router()).await {
            error!(service = "admin", event = "serve_failed", error = %e, "admin server stopped");
        }
    }))
}
