//! Error types for pagepilot-tools

use thiserror::Error;

/// Errors that abort a tool call before it produces a result.
///
/// Failures that happen while talking to the page (no client, timeout,
/// disconnect, page-side error) are not errors at this level; they come back
/// as a failed [`ToolResult`](crate::ToolResult).
#[derive(Debug, Error)]
pub enum Error {
    /// No tool with this name
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments missing or of the wrong type
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Bug or unexpected state inside the bridge
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<pagepilot_core::Error> for Error {
    fn from(err: pagepilot_core::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
