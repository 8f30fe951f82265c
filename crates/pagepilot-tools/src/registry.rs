//! Registry - Tool definitions and lookup
//!
//! Tools are registered once at startup and never change afterwards. The
//! registry keeps registration order so every listing is deterministic.

use crate::context::ToolContext;
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Which reply budget a tool runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutClass {
    /// Answered locally, never touches a page
    Local,
    /// Read-only page queries
    Read,
    /// Clicks and input fills
    Action,
    /// Page navigation
    Navigate,
}

/// Reply budgets per [`TimeoutClass`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudgets {
    /// Read-only queries
    pub read: Duration,
    /// Click / fill
    pub action: Duration,
    /// Navigation
    pub navigate: Duration,
}

impl Default for TimeoutBudgets {
    fn default() -> Self {
        Self {
            read: Duration::from_millis(5_000),
            action: Duration::from_millis(10_000),
            navigate: Duration::from_millis(15_000),
        }
    }
}

impl TimeoutBudgets {
    /// Budget for a class; local tools get the read budget
    #[must_use]
    pub fn for_class(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Local | TimeoutClass::Read => self.read,
            TimeoutClass::Action => self.action,
            TimeoutClass::Navigate => self.navigate,
        }
    }
}

/// Tool metadata and schema
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name (the `tools/call` name)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for arguments
    pub input_schema: Value,
    /// Path segment of the REST endpoint (`/mcp/tools/{slug}`)
    pub slug: String,
    /// Reply budget class
    pub timeout: TimeoutClass,
    /// Example argument objects
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: slug_for(&name),
            name,
            description: description.into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            timeout: TimeoutClass::Read,
            examples: Vec::new(),
        }
    }

    /// Set the argument schema
    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set the timeout class
    #[must_use]
    pub fn with_timeout(mut self, timeout: TimeoutClass) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add an example argument object
    #[must_use]
    pub fn with_example(mut self, example: Value) -> Self {
        self.examples.push(example);
        self
    }
}

/// `getCurrentPage` → `get-current-page`
fn slug_for(name: &str) -> String {
    let mut slug = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            slug.push('-');
            slug.push(ch.to_ascii_lowercase());
        } else {
            slug.push(ch);
        }
    }
    slug
}

/// Why a tool call failed after it was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No live connection to send the command to
    NoClientConnected,
    /// No reply within the budget
    Timeout,
    /// Target disconnected while the command was in flight
    ConnectionClosed,
    /// The page reported an error
    Remote,
}

impl FailureKind {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoClientConnected => "no_client_connected",
            Self::Timeout => "timeout",
            Self::ConnectionClosed => "connection_closed",
            Self::Remote => "remote",
        }
    }
}

/// Body of a failed tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolFailure {
    /// Always `true`, callers key on it
    pub error: bool,
    /// Failure class
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
    /// Tool that failed
    pub tool: String,
    /// Session id the caller asked for, if any
    pub session_id: Option<String>,
    /// Time spent waiting, for timeouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl ToolFailure {
    /// Create a failure body
    #[must_use]
    pub fn new(
        kind: FailureKind,
        message: impl Into<String>,
        tool: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            error: true,
            kind,
            message: message.into(),
            tool: tool.into(),
            session_id,
            elapsed_ms: None,
        }
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Whether execution succeeded
    pub success: bool,
    /// Output data (`null` on failure)
    pub output: Value,
    /// Failure body if failed
    pub failure: Option<ToolFailure>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a successful result
    #[must_use]
    pub fn success(output: Value, duration_ms: u64) -> Self {
        Self {
            success: true,
            output,
            failure: None,
            duration_ms,
        }
    }

    /// Create a failed result
    #[must_use]
    pub fn failure(failure: ToolFailure, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: Value::Null,
            failure: Some(failure),
            duration_ms,
        }
    }
}

/// Trait for tool implementations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool with already-normalized object arguments
    async fn execute(
        &self,
        ctx: &ToolContext,
        args: &serde_json::Map<String, Value>,
    ) -> Result<ToolResult>;
}

/// Registry for managing tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
    by_slug: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let def = tool.definition();
        let (name, slug) = (def.name.clone(), def.slug.clone());
        debug!(tool = %name, slug = %slug, "Registering tool");

        match self.by_name.get(&name) {
            Some(&idx) => self.tools[idx] = tool,
            None => {
                let idx = self.tools.len();
                self.tools.push(tool);
                self.by_name.insert(name, idx);
                self.by_slug.insert(slug, idx);
            }
        }
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| Arc::clone(&self.tools[idx]))
    }

    /// Get a tool by REST slug
    #[must_use]
    pub fn get_by_slug(&self, slug: &str) -> Option<Arc<dyn Tool>> {
        self.by_slug.get(slug).map(|&idx| Arc::clone(&self.tools[idx]))
    }

    /// Check if a tool exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// List all tool names in registration order
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.definition().name.as_str()).collect()
    }

    /// List all tool definitions in registration order
    #[must_use]
    pub fn list_definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Get tool count
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
