//! Server initialization and main run loop
//!
//! Contains the main `run()` function that starts all server components.

use super::config::{AppConfig, ServerConfig};
use super::state::AppState;
use crate::api::api_router;
use crate::websocket::websocket_router;
use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Extension, Router};
use pagepilot_core::shutdown::cancel_on_signal;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Run the server in the configured mode
pub async fn run(config: AppConfig) -> Result<()> {
    info!("Starting pagepilot v{}", env!("CARGO_PKG_VERSION"));
    config.validate()?;

    let shutdown = CancellationToken::new();
    let signal_task = cancel_on_signal(shutdown.clone());

    let state = AppState::from_config(&config, shutdown.clone());
    let eviction = state
        .registry
        .spawn_eviction(config.bridge.eviction_interval(), shutdown.clone());

    let mode = config.server.mode;
    info!(
        mode = ?mode,
        tools = state.dispatcher().tool_names().len(),
        environment = %config.server.environment,
        "Bridge initialized"
    );

    let stdio = mode.runs_stdio().then(|| {
        let mcp = state.mcp.clone();
        let token = shutdown.clone();
        tokio::spawn(async move { pagepilot_mcp::stdio::run(&mcp, token).await })
    });

    let outcome = if mode.runs_http() {
        // HTTP decides the process lifetime; stdin closing only stops stdio.
        let result = serve_http(&config.server, state.clone()).await;
        shutdown.cancel();
        result
    } else {
        // Stdio only: EOF on stdin ends the process.
        wait_for_stdio(stdio, &shutdown).await
    };

    shutdown.cancel();
    if let Err(e) = eviction.await {
        warn!(error = %e, "Eviction task ended abnormally");
    }
    signal_task.abort();

    info!("pagepilot shutdown complete");
    outcome
}

/// Wait for the stdio transport to finish, then stop everything else.
async fn wait_for_stdio(
    stdio: Option<tokio::task::JoinHandle<std::io::Result<()>>>,
    shutdown: &CancellationToken,
) -> Result<()> {
    let Some(stdio) = stdio else {
        return Ok(());
    };
    let result = stdio.await.context("Stdio transport task failed")?;
    shutdown.cancel();
    result.context("Stdio transport error")
}

async fn serve_http(server: &ServerConfig, state: AppState) -> Result<()> {
    let cors = cors_layer(&server.allowed_origin)?;
    let shutdown = state.shutdown.clone();
    let app = build_router(state, cors);

    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on http://{}", addr);
    info!("Browser channel on ws://{}/ws and ws://{}/ws/tools", addr, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")
}

/// Assemble every HTTP and WebSocket route over the shared state
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(|| async { "pagepilot MCP bridge" }))
        .merge(api_router())
        .merge(websocket_router())
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// CORS restricted to the hosting web application
pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    if allowed_origin == "*" {
        return Ok(CorsLayer::permissive());
    }
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("Invalid allowed origin: {}", allowed_origin))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}
