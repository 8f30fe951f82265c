//! WebSocket module for pagepilot
//!
//! Browser pages connect here and execute commands on behalf of MCP callers:
//! - /ws/tools - registers the connection as soon as it opens
//! - /ws - selectable only after the page sends a `register` frame

pub mod connection;

use axum::{
    extract::ws::WebSocketUpgrade, response::IntoResponse, routing::get, Extension, Router,
};
use pagepilot_core::Namespace;

use crate::server::AppState;
use connection::handle_browser;

/// Maximum size of a single WS text message (1 MB).
const MAX_MESSAGE_BYTES: usize = 1_048_576;

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new()
        .route("/ws", get(browser_handler))
        .route("/ws/tools", get(tools_handler))
}

/// WebSocket upgrade handler for `/ws`.
pub async fn browser_handler(
    ws: WebSocketUpgrade,
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    upgrade(ws, state, Namespace::Default)
}

/// WebSocket upgrade handler for `/ws/tools`.
pub async fn tools_handler(
    ws: WebSocketUpgrade,
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    upgrade(ws, state, Namespace::Tools)
}

fn upgrade(ws: WebSocketUpgrade, state: AppState, namespace: Namespace) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_BYTES)
        .on_upgrade(move |socket| handle_browser(socket, namespace, state))
}
