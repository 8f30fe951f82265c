//! Pagepilot MCP - JSON-RPC 2.0 front-end
//!
//! - jsonrpc: request/response envelope types
//! - validate: pure envelope validation into typed MCP methods
//! - server: method routing onto the tool dispatcher
//! - stdio: newline-delimited transport over stdin/stdout

#![forbid(unsafe_code)]

pub mod jsonrpc;
pub mod server;
pub mod stdio;
pub mod validate;

pub use jsonrpc::{codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use server::{call_tool_result, McpServer, PROTOCOL_VERSION};
pub use validate::{Envelope, McpMethod};
