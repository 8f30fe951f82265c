//! Sessions API endpoints
//!
//! GET /sessions             - every registered browser connection
//! GET /sessions/:id/status  - whether a session id currently reaches a live page

use axum::{extract::Path, routing::get, Extension, Json, Router};
use chrono::Utc;
use pagepilot_core::{ConnectionInfo, SessionStatus};
use serde::Serialize;

use crate::server::AppState;

/// Registered connections
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub total_connected_clients: usize,
    pub connections: Vec<ConnectionInfo>,
    pub timestamp: String,
}

/// One session's status
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    #[serde(flatten)]
    pub status: SessionStatus,
    pub timestamp: String,
}

async fn list_sessions(Extension(state): Extension<AppState>) -> Json<SessionsResponse> {
    let connections = state.registry.snapshot().await;
    Json(SessionsResponse {
        total_connected_clients: connections.iter().filter(|c| c.alive).count(),
        connections,
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn session_status(
    Extension(state): Extension<AppState>,
    Path(session_id): Path<String>,
) -> Json<SessionStatusResponse> {
    Json(SessionStatusResponse {
        status: state.registry.session_status(&session_id).await,
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Create sessions routes
pub fn sessions_routes() -> Router {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/:id/status", get(session_status))
}
