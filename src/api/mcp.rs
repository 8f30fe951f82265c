//! JSON-RPC over HTTP
//!
//! POST /mcp - one JSON-RPC 2.0 message per request

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};

use crate::server::AppState;

/// Handle one JSON-RPC message.
///
/// The body is taken as raw bytes so malformed JSON or invalid UTF-8 is
/// answered with a JSON-RPC parse error rather than an HTTP rejection.
/// Notifications are acknowledged with `202 Accepted` and an empty body.
async fn handle_rpc(Extension(state): Extension<AppState>, body: Bytes) -> Response {
    match state.mcp.handle_bytes(&body).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Create JSON-RPC routes
pub fn mcp_routes() -> Router {
    Router::new().route("/mcp", post(handle_rpc))
}
