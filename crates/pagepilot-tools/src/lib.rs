//! Pagepilot Tools - Tool definitions and dispatch
//!
//! This crate provides the tool layer of the bridge:
//! - Registry: tool definitions, the `Tool` trait and lookup by name or REST slug
//! - Args: translation of legacy argument spellings into canonical parameters
//! - Dispatcher: transport-agnostic `tools/call` entry point
//! - Builtins: echo and the five page tools

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod args;
pub mod builtins;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod registry;

pub use builtins::register_builtins;
pub use context::ToolContext;
pub use dispatcher::Dispatcher;
pub use error::{Error, Error as ToolError, Result};
pub use registry::{
    FailureKind, TimeoutBudgets, TimeoutClass, Tool, ToolDefinition, ToolFailure, ToolRegistry,
    ToolResult,
};
