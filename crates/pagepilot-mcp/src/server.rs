//! MCP method routing
//!
//! [`McpServer`] answers validated envelopes. Every transport (stdio, HTTP
//! JSON-RPC, REST) shares one instance and therefore one dispatcher.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

use pagepilot_tools::{Dispatcher, Error as ToolError, ToolResult};

use crate::jsonrpc::{codes, JsonRpcResponse, RequestId};
use crate::validate::{self, Envelope, McpMethod, ToolCallParams};

/// MCP protocol revision announced in `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name announced in `initialize`
pub const SERVER_NAME: &str = "pagepilot";

/// MCP tool descriptor as listed by `tools/list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct McpToolDef<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

/// JSON-RPC / MCP front-end over a [`Dispatcher`].
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
    expose_internal_errors: bool,
}

impl McpServer {
    /// Create a server
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            expose_internal_errors: false,
        }
    }

    /// Include internal error detail in `error.data` (development only)
    #[must_use]
    pub fn with_internal_error_detail(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Underlying dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Handle one raw message. `None` means nothing is sent back.
    pub async fn handle_str(&self, text: &str) -> Option<JsonRpcResponse> {
        self.handle_bytes(text.as_bytes()).await
    }

    /// Handle one raw message that may not be valid UTF-8.
    pub async fn handle_bytes(&self, bytes: &[u8]) -> Option<JsonRpcResponse> {
        match validate::parse_bytes(bytes) {
            Ok(envelope) => self.handle_envelope(envelope).await,
            Err(response) => Some(response),
        }
    }

    /// Handle one parsed message. `None` means nothing is sent back.
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match validate::validate(value) {
            Ok(envelope) => self.handle_envelope(envelope).await,
            Err(response) => Some(response),
        }
    }

    /// Answer a validated envelope.
    pub async fn handle_envelope(&self, envelope: Envelope) -> Option<JsonRpcResponse> {
        let Envelope { id, method } = envelope;
        debug!(method = method.name(), "MCP request");

        let response = match method {
            McpMethod::Notification(name) => {
                debug!(method = %name, "Notification received");
                return None;
            }
            McpMethod::Initialize(params) => {
                debug!(
                    client = %params.client_info.name,
                    client_version = %params.client_info.version,
                    requested = %params.protocol_version,
                    "MCP initialize"
                );
                JsonRpcResponse::ok(id, self.initialize_result())
            }
            McpMethod::ToolsList => JsonRpcResponse::ok(id, self.tools_list_result()),
            McpMethod::ToolsCall(params) => self.tools_call(id, params).await,
            McpMethod::Ping => JsonRpcResponse::ok(id, json!({})),
            McpMethod::ResourcesList => JsonRpcResponse::ok(id, json!({ "resources": [] })),
            McpMethod::PromptsList => JsonRpcResponse::ok(id, json!({ "prompts": [] })),
        };
        Some(response)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    fn tools_list_result(&self) -> Value {
        let tools: Vec<McpToolDef<'_>> = self
            .dispatcher
            .definitions()
            .into_iter()
            .map(|def| McpToolDef {
                name: &def.name,
                description: &def.description,
                input_schema: &def.input_schema,
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn tools_call(&self, id: Option<RequestId>, params: ToolCallParams) -> JsonRpcResponse {
        let ToolCallParams { name, arguments } = params;
        match self.dispatcher.call(&name, arguments).await {
            Ok(result) => JsonRpcResponse::ok(id, call_tool_result(&result)),
            Err(ToolError::UnknownTool(tool)) => JsonRpcResponse::err(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", tool),
            ),
            Err(ToolError::InvalidArguments(detail)) => JsonRpcResponse::err_with_data(
                id,
                codes::INVALID_PARAMS,
                "Invalid params",
                Some(Value::String(detail)),
            ),
            Err(ToolError::Internal(detail)) => {
                error!(tool = %name, error = %detail, "Tool call failed internally");
                let data = self.expose_internal_errors.then(|| Value::String(detail));
                JsonRpcResponse::err_with_data(id, codes::INTERNAL_ERROR, "Internal error", data)
            }
        }
    }
}

/// MCP `tools/call` result body for a tool outcome.
///
/// Successful string outputs are sent as-is, anything else as pretty JSON.
/// Failures carry their failure body and `isError: true`.
#[must_use]
pub fn call_tool_result(result: &ToolResult) -> Value {
    let text = match &result.failure {
        Some(failure) => pretty(&json!(failure)),
        None => match &result.output {
            Value::String(s) => s.clone(),
            other => pretty(other),
        },
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": result.failure.is_some(),
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
