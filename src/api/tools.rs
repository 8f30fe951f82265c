//! Tools REST endpoints
//!
//! GET  /mcp/tools        - tool catalogue with schemas, examples and endpoints
//! POST /mcp/tools/:slug  - run one tool; the body is its argument object

use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use pagepilot_tools::{Error as ToolError, FailureKind, ToolDefinition, ToolFailure};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::server::AppState;

/// Catalogue entry: the definition plus how to reach it over REST
#[derive(Debug, Serialize)]
pub struct ToolInfo<'a> {
    #[serde(flatten)]
    pub definition: &'a ToolDefinition,
    pub endpoint: String,
    pub method: &'static str,
}

/// Tool catalogue
#[derive(Debug, Serialize)]
pub struct ToolCatalogue<'a> {
    pub tools: Vec<ToolInfo<'a>>,
    pub count: usize,
}

/// Successful REST tool response
#[derive(Debug, Serialize)]
pub struct ToolSuccess {
    pub success: bool,
    pub tool: String,
    pub result: Value,
    pub timestamp: String,
}

/// Failed REST tool response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolErrorResponse {
    pub success: bool,
    pub tool: String,
    pub error: Value,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_tools: Option<Vec<String>>,
}

impl ToolErrorResponse {
    fn new(tool: impl Into<String>, error: Value) -> Self {
        Self {
            success: false,
            tool: tool.into(),
            error,
            timestamp: Utc::now().to_rfc3339(),
            available_tools: None,
        }
    }
}

/// HTTP status for a tool-level failure
pub fn failure_status(failure: &ToolFailure) -> StatusCode {
    match failure.kind {
        FailureKind::NoClientConnected => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::ConnectionClosed => StatusCode::BAD_GATEWAY,
        FailureKind::Remote => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn list_tools(Extension(state): Extension<AppState>) -> Json<Value> {
    let tools: Vec<ToolInfo<'_>> = state
        .dispatcher()
        .definitions()
        .into_iter()
        .map(|definition| ToolInfo {
            endpoint: format!("/mcp/tools/{}", definition.slug),
            method: "POST",
            definition,
        })
        .collect();
    let count = tools.len();
    Json(json!(ToolCatalogue { tools, count }))
}

async fn run_tool(
    Extension(state): Extension<AppState>,
    Path(slug): Path<String>,
    body: Bytes,
) -> Response {
    let dispatcher = state.dispatcher();
    let Some(definition) = dispatcher.definition_for_slug(&slug) else {
        let mut body = ToolErrorResponse::new(slug.as_str(), json!("Unknown tool endpoint"));
        body.available_tools = Some(
            dispatcher
                .definitions()
                .into_iter()
                .map(|def| def.slug.clone())
                .collect(),
        );
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    };
    let name = definition.name;

    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                let body = ToolErrorResponse::new(name, json!(format!("Invalid JSON body: {}", e)));
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
        }
    };

    match dispatcher.call(&name, arguments).await {
        Ok(result) => match result.failure {
            None => Json(ToolSuccess {
                success: true,
                tool: name,
                result: result.output,
                timestamp: Utc::now().to_rfc3339(),
            })
            .into_response(),
            Some(failure) => {
                let status = failure_status(&failure);
                let body = ToolErrorResponse::new(name, json!(failure));
                (status, Json(body)).into_response()
            }
        },
        Err(ToolError::InvalidArguments(detail)) => {
            (StatusCode::BAD_REQUEST, Json(ToolErrorResponse::new(name, json!(detail)))).into_response()
        }
        Err(ToolError::UnknownTool(tool)) => {
            let body = ToolErrorResponse::new(tool, json!("Unknown tool"));
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        Err(ToolError::Internal(detail)) => {
            error!(tool = %name, error = %detail, "REST tool call failed internally");
            let body = ToolErrorResponse::new(name, json!("Internal error"));
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Create tools routes
pub fn tools_routes() -> Router {
    Router::new()
        .route("/mcp/tools", get(list_tools))
        .route("/mcp/tools/:slug", post(run_tool))
}
