use std::net::SocketAddr;

use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use common::admin_http::spawn_admin_server;

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; shutdown only on process exit");
        std::future::pending::<()>().await;
    }
    info!(service = "server", event = "shutdown_signal", "received Ctrl+C, shutting down");
}

/// Public entry: build the app and run the HTTP server until Ctrl+C
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    // 管理端口（/healthz, /metrics）按配置可选启用
    if cfg.admin.enabled {
        spawn_admin_server(&cfg.admin.addr).await?;
    }

    let state = AppState::in_memory();
    let app = routes::build_router(state, build_cors());

    let addr = cfg.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    let local: SocketAddr = listener.local_addr().map_err(StartupError::Serve)?;
    info!(service = "server", event = "listen", addr = %local, "user registry listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;
    Ok(())
}
