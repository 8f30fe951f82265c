//! Dispatcher - Routes `tools/call` requests to tool handlers
//!
//! The dispatcher is transport-agnostic: stdio, HTTP JSON-RPC and the REST
//! endpoints all end up in [`Dispatcher::call`].

use std::sync::Arc;
use std::time::Instant;

use pagepilot_core::{RequestCorrelator, SessionRegistry};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::args;
use crate::builtins::register_builtins;
use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{TimeoutBudgets, Tool, ToolDefinition, ToolRegistry, ToolResult};

/// Static name → handler mapping plus the bridge state the handlers use.
pub struct Dispatcher {
    tools: ToolRegistry,
    ctx: ToolContext,
}

impl Dispatcher {
    /// Dispatcher with the built-in tools
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        correlator: Arc<RequestCorrelator>,
        budgets: TimeoutBudgets,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        register_builtins(&mut tools);
        Self::with_tools(tools, ToolContext::new(registry, correlator, budgets))
    }

    /// Dispatcher over an explicit tool set
    #[must_use]
    pub fn with_tools(tools: ToolRegistry, ctx: ToolContext) -> Self {
        Self { tools, ctx }
    }

    /// Tool definitions in catalogue order
    #[must_use]
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.list_definitions()
    }

    /// Tool names in catalogue order
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.list_names()
    }

    /// Definition behind a REST slug
    #[must_use]
    pub fn definition_for_slug(&self, slug: &str) -> Option<ToolDefinition> {
        self.tools
            .get_by_slug(slug)
            .map(|tool| tool.definition().clone())
    }

    /// Shared bridge state
    #[must_use]
    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Run a tool by name.
    ///
    /// Unknown names and malformed arguments are errors; everything that goes
    /// wrong after the tool accepted its arguments is a failed [`ToolResult`].
    #[instrument(skip(self, arguments), fields(tool = %name))]
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> Result<ToolResult> {
        let tool: Arc<dyn Tool> = self
            .tools
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;
        let args = args::into_object(arguments)?;

        let started = Instant::now();
        let mut result = tool.execute(&self.ctx, &args).await?;
        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result.failure {
            None => info!(duration_ms = result.duration_ms, "Tool call succeeded"),
            Some(failure) => warn!(
                duration_ms = result.duration_ms,
                kind = failure.kind.as_str(),
                message = %failure.message,
                "Tool call failed"
            ),
        }
        Ok(result)
    }
}
