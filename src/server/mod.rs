//! Server module for pagepilot
//!
//! Contains the server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `state`: Shared registry, correlator and MCP front-end
//! - `init`: Router assembly and main run loop

pub mod config;
mod init;
mod loader;
mod state;

// Re-export public API
pub use init::{build_router, run};
pub use loader::load_config;
pub use state::AppState;

#[cfg(test)]
pub(crate) use state::test_support;
