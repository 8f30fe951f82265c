//! Shared state handed to every tool call.

use pagepilot_core::{Command, CommandReply, RequestCorrelator, SessionRegistry};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::registry::{FailureKind, TimeoutBudgets, TimeoutClass, ToolFailure, ToolResult};

/// Bridge state a tool needs to reach a page.
#[derive(Clone)]
pub struct ToolContext {
    /// Live browser connections
    pub registry: Arc<SessionRegistry>,
    /// Pending command table
    pub correlator: Arc<RequestCorrelator>,
    /// Reply budgets
    pub budgets: TimeoutBudgets,
}

impl ToolContext {
    /// Create a context
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        correlator: Arc<RequestCorrelator>,
        budgets: TimeoutBudgets,
    ) -> Self {
        Self {
            registry,
            correlator,
            budgets,
        }
    }

    /// Resolve a target, send one command and map the outcome.
    ///
    /// A missing target fails with `no_client_connected` before anything is
    /// written to any channel.
    pub async fn run_command(
        &self,
        tool: &str,
        session_id: Option<String>,
        command: Command,
        class: TimeoutClass,
    ) -> Result<ToolResult> {
        let started = Instant::now();
        let elapsed = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let target = self.registry.resolve(session_id.as_deref()).await;
        let conn = match target {
            Ok(conn) => conn,
            Err(e) if e.is_not_found() => {
                warn!(tool, session_id = ?session_id, "No browser client for tool call");
                let failure =
                    ToolFailure::new(FailureKind::NoClientConnected, e.to_string(), tool, session_id);
                return Ok(ToolResult::failure(failure, elapsed()));
            }
            Err(e) => return Err(Error::from(e)),
        };

        debug!(tool, conn_id = %conn.id(), method = command.method(), "Dispatching command");
        let budget = self.budgets.for_class(class);
        let outcome = self.correlator.send(&conn, &command, budget).await;

        let failure = |kind, message: String| ToolFailure::new(kind, message, tool, session_id.clone());
        let result = match outcome {
            Ok(reply) => ToolResult::success(reply_to_value(&reply)?, elapsed()),
            Err(pagepilot_core::Error::Timeout { elapsed_ms }) => {
                let mut body = failure(
                    FailureKind::Timeout,
                    format!("{} timed out after {}ms", command.method(), elapsed_ms),
                );
                body.elapsed_ms = Some(elapsed_ms);
                ToolResult::failure(body, elapsed())
            }
            Err(e @ pagepilot_core::Error::ConnectionClosed(_)) => {
                ToolResult::failure(failure(FailureKind::ConnectionClosed, e.to_string()), elapsed())
            }
            Err(pagepilot_core::Error::Remote(message)) => {
                ToolResult::failure(failure(FailureKind::Remote, message), elapsed())
            }
            Err(e) => return Err(Error::from(e)),
        };
        Ok(result)
    }
}

fn reply_to_value(reply: &CommandReply) -> Result<serde_json::Value> {
    serde_json::to_value(reply).map_err(|e| Error::Internal(e.to_string()))
}
