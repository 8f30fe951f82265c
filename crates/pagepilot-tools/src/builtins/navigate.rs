//! Navigation tool

use crate::args::{self, Args};
use crate::context::ToolContext;
use crate::error::Result;
use crate::registry::{TimeoutClass, Tool, ToolDefinition, ToolResult};
use pagepilot_core::wire::NavigatePageParams;
use pagepilot_core::Command;
use serde_json::json;

use super::session_id_property;

/// Navigates the page by name or path
pub struct NavigatePageTool {
    definition: ToolDefinition,
}

impl NavigatePageTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("navigatePage", "Navigate to a page")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "page": {
                        "type": "string",
                        "description": "Page name or path to navigate to (e.g. \"contact\" or \"/contact\"); alias: path"
                    },
                    "sessionId": session_id_property()
                },
                "required": ["page"]
            }))
            .with_timeout(TimeoutClass::Navigate)
            .with_example(json!({"page": "/contact"}));

        Self { definition }
    }
}

impl Default for NavigatePageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for NavigatePageTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, ctx: &ToolContext, args: &Args) -> Result<ToolResult> {
        let session_id = args::session_id(args)?;
        let page = args::required_string(args, &["page", "path"])?;
        ctx.run_command(
            &self.definition.name,
            session_id,
            Command::NavigatePage(NavigatePageParams { page }),
            self.definition.timeout,
        )
        .await
    }
}
