//! Web API module for pagepilot
//!
//! Provides HTTP endpoints for:
//! - JSON-RPC 2.0 over HTTP (`/mcp`)
//! - Tool catalogue and one REST endpoint per tool (`/mcp/tools`)
//! - Health and capability summary
//! - Browser session inspection

pub mod health;
pub mod mcp;
pub mod sessions;
pub mod tools;

use axum::Router;

pub use health::health_routes;
pub use mcp::mcp_routes;
pub use sessions::sessions_routes;
pub use tools::tools_routes;

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(mcp_routes())
        .merge(tools_routes())
        .merge(health_routes())
        .merge(sessions_routes())
}
