//! Browser wire protocol.
//!
//! Every message on the persistent browser channel is one [`BridgeFrame`],
//! serialized as a JSON text frame tagged by `frame`. Commands flow server →
//! browser and carry a correlation id that the browser echoes back in its
//! `reply` frame.
//!
//! Command parameters and reply payloads are typed per command ([`Command`],
//! [`CommandReply`]); the untyped `params`/`result` values only exist at the
//! frame boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Wire frame exchanged with a browser endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BridgeFrame {
    /// Server → browser: execute a command
    Command {
        /// Correlation id, echoed back in the reply
        id: String,
        /// Command method (e.g. "clickElement")
        method: String,
        /// Command parameters
        #[serde(default)]
        params: Value,
    },
    /// Browser → server: outcome of a command
    Reply {
        /// Correlation id of the command being answered
        id: String,
        /// Successful result (mutually exclusive with error)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        /// Failure reported by the page (mutually exclusive with result)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<RemoteError>,
    },
    /// Browser → server: make this connection selectable, optionally under a session id
    Register {
        /// Caller-visible session id to bind
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        /// Client metadata
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client: Option<ClientInfo>,
    },
    /// Server → browser: registration acknowledged
    Registered {
        /// Transport-assigned connection id
        connection_id: Uuid,
        /// Bound session id, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    /// Application-level keep-alive
    Ping,
    /// Keep-alive answer
    Pong,
}

impl BridgeFrame {
    /// Serialize to a JSON text frame.
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON text frame.
    pub fn from_text(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Browser-side metadata sent with `register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name
    #[serde(default)]
    pub name: String,
    /// Browser user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Failure reported by the page itself (element missing, input disabled, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RemoteErrorRepr")]
pub struct RemoteError {
    /// Human-readable message
    pub message: String,
    /// Optional machine-readable code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// Browsers send either a bare string or `{message, code?}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteErrorRepr {
    Text(String),
    Detailed {
        message: String,
        #[serde(default)]
        code: Option<String>,
    },
}

impl From<RemoteErrorRepr> for RemoteError {
    fn from(repr: RemoteErrorRepr) -> Self {
        match repr {
            RemoteErrorRepr::Text(message) => Self {
                message,
                code: None,
            },
            RemoteErrorRepr::Detailed { message, code } => Self { message, code },
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Which elements `getElements` enumerates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Buttons, links and anything tagged clickable
    #[default]
    Clickable,
    /// Form inputs
    Input,
    /// Both of the above
    All,
}

impl ElementKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clickable => "clickable",
            Self::Input => "input",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "clickable" => Ok(Self::Clickable),
            "input" => Ok(Self::Input),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown element type '{}', expected clickable, input or all",
                other
            )),
        }
    }
}

/// Value written into an input: text for text-like fields, a flag for checkboxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Checkbox / toggle state
    Flag(bool),
    /// Text, select option or radio value
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetElementsParams {
    pub element_type: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickElementParams {
    pub element_name: String,
}

/// Canonical `fillInput` payload. Every entry transport is normalized to this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInputParams {
    pub element_name: String,
    pub element_type: String,
    pub data: InputValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigatePageParams {
    pub page: String,
}

/// A command the browser can execute, one variant per wire method.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetCurrentPage,
    GetElements(GetElementsParams),
    ClickElement(ClickElementParams),
    FillInput(FillInputParams),
    NavigatePage(NavigatePageParams),
}

impl Command {
    /// Wire method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::GetCurrentPage => "getCurrentPage",
            Self::GetElements(_) => "getElements",
            Self::ClickElement(_) => "clickElement",
            Self::FillInput(_) => "fillInput",
            Self::NavigatePage(_) => "navigatePage",
        }
    }

    /// Wire parameters.
    pub fn params(&self) -> Result<Value> {
        let params = match self {
            Self::GetCurrentPage => Value::Object(serde_json::Map::new()),
            Self::GetElements(p) => serde_json::to_value(p)?,
            Self::ClickElement(p) => serde_json::to_value(p)?,
            Self::FillInput(p) => serde_json::to_value(p)?,
            Self::NavigatePage(p) => serde_json::to_value(p)?,
        };
        Ok(params)
    }

    /// Build the command frame for a correlation id.
    pub fn to_frame(&self, id: impl Into<String>) -> Result<BridgeFrame> {
        Ok(BridgeFrame::Command {
            id: id.into(),
            method: self.method().to_string(),
            params: self.params()?,
        })
    }

    /// Decode the `result` of a reply frame into the payload this command expects.
    pub fn decode_reply(&self, result: Value) -> Result<CommandReply> {
        let method = self.method();
        let malformed = |e: serde_json::Error| Error::MalformedReply {
            method,
            message: e.to_string(),
        };

        match self {
            Self::GetCurrentPage => serde_json::from_value(result)
                .map(CommandReply::Page)
                .map_err(malformed),
            Self::GetElements(p) => {
                // Older page builds answer with the bare element array
                if result.is_array() {
                    let elements = serde_json::from_value(result).map_err(malformed)?;
                    return Ok(CommandReply::Elements(ElementsReply {
                        elements,
                        element_type: p.element_type,
                    }));
                }
                serde_json::from_value(result)
                    .map(CommandReply::Elements)
                    .map_err(malformed)
            }
            Self::ClickElement(_) => serde_json::from_value(result)
                .map(CommandReply::Click)
                .map_err(malformed),
            Self::FillInput(_) => serde_json::from_value(result)
                .map(CommandReply::FillInput)
                .map_err(malformed),
            Self::NavigatePage(_) => serde_json::from_value(result)
                .map(CommandReply::Navigation)
                .map_err(malformed),
        }
    }
}

// ============================================================================
// Replies
// ============================================================================

/// `getCurrentPage` reply: the page identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub title: String,
    pub url: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// On-screen coordinates of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One element reported by `getElements`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub name: String,
    #[serde(default)]
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// HTML element / input type
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, alias = "isVisible", skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<ElementKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// `getElements` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementsReply {
    #[serde(default)]
    pub elements: Vec<PageElement>,
    #[serde(default)]
    pub element_type: ElementKind,
}

/// `clickElement` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResult {
    pub success: bool,
    pub element_name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<PageInfo>,
}

/// `fillInput` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInputResult {
    pub success: bool,
    pub input_name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `navigatePage` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResult {
    pub success: bool,
    pub target_page: String,
    #[serde(default)]
    pub current_url: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<PageInfo>,
}

/// Typed reply payload, one variant per command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandReply {
    Page(PageInfo),
    Elements(ElementsReply),
    Click(ClickResult),
    FillInput(FillInputResult),
    Navigation(NavigationResult),
}
