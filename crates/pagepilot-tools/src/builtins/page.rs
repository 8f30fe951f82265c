//! Page query tools

use crate::args::{self, Args};
use crate::context::ToolContext;
use crate::error::Result;
use crate::registry::{TimeoutClass, Tool, ToolDefinition, ToolResult};
use pagepilot_core::wire::GetElementsParams;
use pagepilot_core::Command;
use serde_json::json;

use super::session_id_property;

/// Reports title, URL and path of the page
pub struct GetCurrentPageTool {
    definition: ToolDefinition,
}

impl GetCurrentPageTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("getCurrentPage", "Get current page information")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "sessionId": session_id_property()
                },
                "required": []
            }))
            .with_timeout(TimeoutClass::Read)
            .with_example(json!({}));

        Self { definition }
    }
}

impl Default for GetCurrentPageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GetCurrentPageTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, ctx: &ToolContext, args: &Args) -> Result<ToolResult> {
        let session_id = args::session_id(args)?;
        ctx.run_command(
            &self.definition.name,
            session_id,
            Command::GetCurrentPage,
            self.definition.timeout,
        )
        .await
    }
}

/// Lists clickable elements, inputs, or both
pub struct GetElementsTool {
    definition: ToolDefinition,
}

impl GetElementsTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "getElements",
            "Get elements on current page by type (clickable, input, or all)",
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "elementType": {
                    "type": "string",
                    "enum": ["clickable", "input", "all"],
                    "description": "Type of elements to retrieve",
                    "default": "clickable"
                },
                "sessionId": session_id_property()
            },
            "required": []
        }))
        .with_timeout(TimeoutClass::Read)
        .with_example(json!({"elementType": "clickable"}))
        .with_example(json!({"elementType": "input"}));

        Self { definition }
    }
}

impl Default for GetElementsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GetElementsTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, ctx: &ToolContext, args: &Args) -> Result<ToolResult> {
        let session_id = args::session_id(args)?;
        let element_type = args::element_kind(args)?;
        ctx.run_command(
            &self.definition.name,
            session_id,
            Command::GetElements(GetElementsParams { element_type }),
            self.definition.timeout,
        )
        .await
    }
}
