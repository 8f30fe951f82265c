//! Echo tool

use crate::args::{self, Args};
use crate::context::ToolContext;
use crate::error::Result;
use crate::registry::{TimeoutClass, Tool, ToolDefinition, ToolResult};
use serde_json::json;

/// Echoes its message back without touching any page
pub struct EchoTool {
    definition: ToolDefinition,
}

impl EchoTool {
    /// Create a new echo tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("echo", "Echo back the input message")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "Message to echo back"
                    }
                },
                "required": ["message"]
            }))
            .with_timeout(TimeoutClass::Local)
            .with_example(json!({"message": "Hello, MCP!"}));

        Self { definition }
    }
}

impl Default for EchoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _ctx: &ToolContext, args: &Args) -> Result<ToolResult> {
        let message = args::optional_string(args, &["message"])?
            .ok_or_else(|| crate::Error::InvalidArguments("message is required".to_string()))?;

        Ok(ToolResult::success(
            json!({
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }),
            0,
        ))
    }
}
