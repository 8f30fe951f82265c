//! Builtins - The tools every bridge exposes
//!
//! - echo: answered locally, a liveness probe for callers
//! - Page queries: getCurrentPage, getElements
//! - Interaction: clickElement, fillInput
//! - Navigation: navigatePage

mod echo;
mod interact;
mod navigate;
mod page;

pub use echo::EchoTool;
pub use interact::{ClickElementTool, FillInputTool};
pub use navigate::NavigatePageTool;
pub use page::{GetCurrentPageTool, GetElementsTool};

use crate::registry::ToolRegistry;
use serde_json::{json, Value};
use std::sync::Arc;

/// Register all built-in tools, in catalogue order
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(Arc::new(EchoTool::new()));
    registry.register(Arc::new(GetCurrentPageTool::new()));
    registry.register(Arc::new(GetElementsTool::new()));
    registry.register(Arc::new(ClickElementTool::new()));
    registry.register(Arc::new(FillInputTool::new()));
    registry.register(Arc::new(NavigatePageTool::new()));
}

/// Schema of the optional `sessionId` argument shared by the page tools
pub(crate) fn session_id_property() -> Value {
    json!({
        "type": "string",
        "description": "Optional session ID to target a specific browser client"
    })
}
