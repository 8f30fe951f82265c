//! Interaction tools
//!
//! Both tools accept the element name as `elementName`, `inputName` or `name`
//! and always put `elementName` on the wire.

use crate::args::{self, Args};
use crate::context::ToolContext;
use crate::error::Result;
use crate::registry::{TimeoutClass, Tool, ToolDefinition, ToolResult};
use pagepilot_core::wire::{ClickElementParams, FillInputParams};
use pagepilot_core::Command;
use serde_json::json;
use tracing::debug;

use super::session_id_property;

const DEFAULT_INPUT_TYPE: &str = "text";

/// Clicks a named element
pub struct ClickElementTool {
    definition: ToolDefinition,
}

impl ClickElementTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("clickElement", "Click a named element")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "elementName": {
                        "type": "string",
                        "description": "Element name to click (alias: name)"
                    },
                    "sessionId": session_id_property()
                },
                "required": ["elementName"]
            }))
            .with_timeout(TimeoutClass::Action)
            .with_example(json!({"elementName": "submit-btn"}));

        Self { definition }
    }
}

impl Default for ClickElementTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for ClickElementTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, ctx: &ToolContext, args: &Args) -> Result<ToolResult> {
        let session_id = args::session_id(args)?;
        let element_name = args::required_string(args, &["elementName", "name"])?;
        ctx.run_command(
            &self.definition.name,
            session_id,
            Command::ClickElement(ClickElementParams { element_name }),
            self.definition.timeout,
        )
        .await
    }
}

/// Fills text inputs, selects, textareas, radios and checkboxes
pub struct FillInputTool {
    definition: ToolDefinition,
}

impl FillInputTool {
    /// Create a new tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "fillInput",
            "Fill an input element with data (supports text inputs, radio buttons, checkboxes, select dropdowns, textareas)",
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "elementName": {
                    "type": "string",
                    "description": "Name of the input to fill (aliases: inputName, name)"
                },
                "elementType": {
                    "type": "string",
                    "description": "Input type (text, email, password, radio, checkbox, select, textarea, ...); aliases: inputType, type",
                    "default": DEFAULT_INPUT_TYPE
                },
                "data": {
                    "type": ["string", "boolean", "number"],
                    "description": "Value to fill in (alias: value); booleans toggle checkboxes"
                },
                "sessionId": session_id_property()
            },
            "required": ["elementName", "data"]
        }))
        .with_timeout(TimeoutClass::Action)
        .with_example(json!({"elementName": "user-email", "elementType": "email", "data": "test@example.com"}))
        .with_example(json!({"elementName": "agree-terms", "elementType": "checkbox", "data": true}));

        Self { definition }
    }
}

impl Default for FillInputTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for FillInputTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, ctx: &ToolContext, args: &Args) -> Result<ToolResult> {
        let session_id = args::session_id(args)?;
        let element_name = args::required_string(args, &["elementName", "inputName", "name"])?;
        let element_type = args::optional_string(args, &["elementType", "inputType", "type"])?
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_INPUT_TYPE.to_string());
        let data = args::input_value(args)?;
        debug!(element = %element_name, input_type = %element_type, "Normalized fillInput arguments");

        ctx.run_command(
            &self.definition.name,
            session_id,
            Command::FillInput(FillInputParams {
                element_name,
                element_type,
                data,
            }),
            self.definition.timeout,
        )
        .await
    }
}
