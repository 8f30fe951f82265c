//! Operational endpoints.
//!
//! Provides:
//! - `/health` - status plus the connected browser count and ids
//! - `/info` - capability summary

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use pagepilot_mcp::PROTOCOL_VERSION;
use serde::Serialize;
use uuid::Uuid;

use crate::server::AppState;

/// Health response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connected_clients: usize,
    pub client_ids: Vec<Uuid>,
    pub pending_commands: usize,
    pub timestamp: String,
}

/// Capability summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub protocol_version: &'static str,
    pub endpoints: Endpoints,
    pub capabilities: Capabilities,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub json_rpc: &'static str,
    pub tools: &'static str,
    pub websocket: [&'static str; 2],
    pub health: &'static str,
    pub sessions: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub tools: Vec<String>,
    pub transports: [&'static str; 3],
}

async fn health_check(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    let client_ids = state.registry.live_ids().await;
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        connected_clients: client_ids.len(),
        client_ids,
        pending_commands: state.correlator.pending_count(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn info(Extension(state): Extension<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "pagepilot",
        version: env!("CARGO_PKG_VERSION"),
        description: "MCP bridge that drives a live web page through its browser session",
        protocol_version: PROTOCOL_VERSION,
        endpoints: Endpoints {
            json_rpc: "/mcp",
            tools: "/mcp/tools",
            websocket: ["/ws", "/ws/tools"],
            health: "/health",
            sessions: "/sessions",
        },
        capabilities: Capabilities {
            tools: state
                .dispatcher()
                .tool_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            transports: ["stdio", "http", "websocket"],
        },
    })
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(info))
}
