use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::GateConfig;

use super::api::{self, AppState};
use super::grant::{LiveblocksAuthorizer, SyncAuthorizer};

/// Build the gate router over prepared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router().with_state(state)
}

/// Build the handler state from resolved configuration.
pub fn app_state(config: &GateConfig) -> AppState {
    let authorizer = config.sync_secret.as_ref().map(|secret| {
        Arc::new(LiveblocksAuthorizer::new(
            config.sync_base_url.clone(),
            secret.clone(),
        )) as Arc<dyn SyncAuthorizer>
    });
    AppState {
        secrets: config.secrets.clone(),
        authorizer,
    }
}

/// Start the session gate.
pub async fn start_server(config: GateConfig) -> Result<()> {
    if config.secrets.is_empty() {
        tracing::warn!(
            env = crate::config::ROOM_SECRET_ENV,
            "no room key configured; every join will be refused"
        );
    }
    if config.sync_secret.is_none() {
        tracing::warn!(
            env = crate::config::SYNC_SECRET_ENV,
            "no sync service secret; valid joins will fail with a server error"
        );
    }

    let mut app = build_router(Arc::new(app_state(&config)));

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, sync = %config.sync_base_url, "session gate listening");
    println!("Roomboard gate running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
