/// HTTP/WebSocket server for the travel coordinator

use std::sync::Arc;

use anyhow::{Context, Result};

use travel_coordinator::server::{router, AppState};
use travel_coordinator::session::spawn_idle_sweeper;
use travel_coordinator::{init_tracing, AppConfig, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenv::dotenv();
    init_tracing();

    let config = AppConfig::from_env().context("configuration failed")?;

    tracing::info!("[INIT] Server configuration:");
    tracing::info!("  Port: {}", config.port);
    tracing::info!("  App scope: {}", config.app_name);
    tracing::info!("  Toolbox URL: {}", config.toolbox_url);
    tracing::info!("  Auth mode: {:?}", config.auth_mode);
    tracing::info!("  Dispatch timeout: {:?}", config.dispatch_timeout);

    let sessions = Arc::new(SessionStore::new());
    if let Some(ttl) = config.session_idle_ttl {
        tracing::info!("[SESSION] Evicting sessions idle for more than {:?}", ttl);
        spawn_idle_sweeper(sessions.clone(), ttl);
    }

    let state = AppState::from_config(&config, sessions)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    tracing::info!("[STARTUP] Travel coordinator running on http://0.0.0.0:{}", config.port);
    tracing::info!("  POST /query                          — Send a query");
    tracing::info!("  GET  /ws/:session_id                 — Stream events over WebSocket");
    tracing::info!("  GET  /sessions/:user_id/:session_id  — Inspect a session");
    tracing::info!("  GET  /health                         — Check server health");

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
