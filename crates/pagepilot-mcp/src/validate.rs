//! Envelope validation
//!
//! Pure functions from raw text / JSON to a typed [`Envelope`], or to the
//! ready-made error response the caller must send back. No transport and no
//! bridge state is involved.

use serde_json::{Map, Value};

use crate::jsonrpc::{codes, JsonRpcResponse, RequestId, JSONRPC_VERSION};

/// `initialize` client identity
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInfo {
    /// Client name
    pub name: String,
    /// Client version
    pub version: String,
}

/// Validated `initialize` parameters
#[derive(Debug, Clone, PartialEq)]
pub struct InitializeParams {
    /// Protocol version the client speaks
    pub protocol_version: String,
    /// Client identity
    pub client_info: ClientInfo,
}

/// Validated `tools/call` parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallParams {
    /// Tool name
    pub name: String,
    /// Tool arguments, an object when present
    pub arguments: Option<Value>,
}

/// Recognized MCP methods
#[derive(Debug, Clone, PartialEq)]
pub enum McpMethod {
    /// `initialize`
    Initialize(InitializeParams),
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall(ToolCallParams),
    /// `ping`
    Ping,
    /// `resources/list`
    ResourcesList,
    /// `prompts/list`
    PromptsList,
    /// Any `notifications/*`; never answered
    Notification(String),
}

impl McpMethod {
    /// Wire name of the method
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Initialize(_) => "initialize",
            Self::ToolsList => "tools/list",
            Self::ToolsCall(_) => "tools/call",
            Self::Ping => "ping",
            Self::ResourcesList => "resources/list",
            Self::PromptsList => "prompts/list",
            Self::Notification(name) => name,
        }
    }
}

/// A validated request
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Request id; `None` when the caller sent none
    pub id: Option<RequestId>,
    /// Method and typed parameters
    pub method: McpMethod,
}

impl Envelope {
    /// Whether the sender expects no response
    #[must_use]
    pub fn is_notification(&self) -> bool {
        matches!(self.method, McpMethod::Notification(_))
    }
}

/// Validation outcome: an envelope, or the error response to send back
pub type Validated = Result<Envelope, JsonRpcResponse>;

/// Parse and validate one message.
pub fn parse_message(text: &str) -> Validated {
    parse_bytes(text.as_bytes())
}

/// Parse and validate one message from raw bytes. Invalid UTF-8 is a parse error.
pub fn parse_bytes(bytes: &[u8]) -> Validated {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => validate(value),
        Err(e) => Err(JsonRpcResponse::err_with_data(
            Some(RequestId::Null),
            codes::PARSE_ERROR,
            "Parse error",
            Some(Value::String(e.to_string())),
        )),
    }
}

/// Validate an already parsed message.
pub fn validate(value: Value) -> Validated {
    let Value::Object(mut obj) = value else {
        return Err(invalid_request(None, "request must be a JSON object"));
    };

    let id = match obj.get("id") {
        None => None,
        Some(raw) => match RequestId::from_value(raw) {
            Some(id) => Some(id),
            None => return Err(invalid_request(None, "id must be a string, number or null")),
        },
    };

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(invalid_request(id, "jsonrpc must be \"2.0\""));
    }

    let method = match obj.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(invalid_request(id, "method must be a string")),
    };

    let params = match obj.remove("params") {
        None | Some(Value::Null) => None,
        Some(p @ (Value::Object(_) | Value::Array(_))) => Some(p),
        Some(_) => return Err(invalid_request(id, "params must be an object or array")),
    };

    let method = match method_from(&method, params) {
        Ok(method) => method,
        Err(MethodError::NotFound) => {
            return Err(JsonRpcResponse::err(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ))
        }
        Err(MethodError::InvalidParams(detail)) => {
            return Err(JsonRpcResponse::err_with_data(
                id,
                codes::INVALID_PARAMS,
                "Invalid params",
                Some(Value::String(detail)),
            ))
        }
    };

    Ok(Envelope { id, method })
}

enum MethodError {
    NotFound,
    InvalidParams(String),
}

fn method_from(method: &str, params: Option<Value>) -> Result<McpMethod, MethodError> {
    match method {
        "initialize" => {
            let params = object_params(params, true)?;
            let protocol_version = string_field(&params, "protocolVersion")?;
            let client_info = match params.get("clientInfo") {
                Some(Value::Object(info)) => ClientInfo {
                    name: string_field(info, "name")
                        .map_err(|_| invalid("clientInfo.name must be a string"))?,
                    version: string_field(info, "version")
                        .map_err(|_| invalid("clientInfo.version must be a string"))?,
                },
                _ => return Err(invalid("clientInfo must be an object")),
            };
            Ok(McpMethod::Initialize(InitializeParams {
                protocol_version,
                client_info,
            }))
        }
        "tools/list" => {
            object_params(params, false)?;
            Ok(McpMethod::ToolsList)
        }
        "tools/call" => {
            let mut params = object_params(params, true)?;
            let name = string_field(&params, "name")?;
            let arguments = match params.remove("arguments") {
                None | Some(Value::Null) => None,
                Some(args @ Value::Object(_)) => Some(args),
                Some(_) => return Err(invalid("arguments must be an object")),
            };
            Ok(McpMethod::ToolsCall(ToolCallParams { name, arguments }))
        }
        "ping" => Ok(McpMethod::Ping),
        "resources/list" => Ok(McpMethod::ResourcesList),
        "prompts/list" => Ok(McpMethod::PromptsList),
        m if m.starts_with("notifications/") => Ok(McpMethod::Notification(m.to_string())),
        _ => Err(MethodError::NotFound),
    }
}

fn object_params(params: Option<Value>, required: bool) -> Result<Map<String, Value>, MethodError> {
    match params {
        Some(Value::Object(map)) => Ok(map),
        None if !required => Ok(Map::new()),
        None => Err(invalid("params are required")),
        Some(_) => Err(invalid("params must be an object")),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Result<String, MethodError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(MethodError::InvalidParams(format!("{} must be a string", key))),
    }
}

fn invalid(detail: &str) -> MethodError {
    MethodError::InvalidParams(detail.to_string())
}

fn invalid_request(id: Option<RequestId>, detail: &str) -> JsonRpcResponse {
    JsonRpcResponse::err_with_data(
        Some(id.unwrap_or(RequestId::Null)),
        codes::INVALID_REQUEST,
        "Invalid Request",
        Some(Value::String(detail.to_string())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code(result: Validated) -> i32 {
        result.unwrap_err().error().unwrap().code
    }

    #[test]
    fn test_parse_error_has_null_id() {
        let resp = parse_message("{not json").unwrap_err();
        assert_eq!(resp.error().unwrap().code, codes::PARSE_ERROR);
        assert_eq!(resp.id(), Some(&RequestId::Null));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let resp = parse_bytes(b"\xff\xfe garbage").unwrap_err();
        assert_eq!(resp.error().unwrap().code, codes::PARSE_ERROR);
        assert_eq!(resp.id(), Some(&RequestId::Null));

        assert!(parse_bytes(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).is_ok());
    }

    #[test]
    fn test_shape_errors_keep_recoverable_id() {
        let resp = validate(json!({"jsonrpc": "1.0", "method": "ping", "id": 7})).unwrap_err();
        assert_eq!(resp.error().unwrap().code, codes::INVALID_REQUEST);
        assert_eq!(resp.id(), Some(&RequestId::from(7)));

        let resp = validate(json!({"jsonrpc": "2.0", "method": 5, "id": "a"})).unwrap_err();
        assert_eq!(resp.id(), Some(&RequestId::from("a")));

        let resp = validate(json!({"jsonrpc": "2.0", "method": "ping", "id": [1]})).unwrap_err();
        assert_eq!(resp.id(), Some(&RequestId::Null));

        assert_eq!(code(validate(json!([1, 2]))), codes::INVALID_REQUEST);
        assert_eq!(
            code(validate(json!({"jsonrpc": "2.0", "method": "ping", "params": "x"}))),
            codes::INVALID_REQUEST
        );
    }

    #[test]
    fn test_initialize_requires_client_info() {
        let ok = validate(json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "cli", "version": "1.0"}}
        }))
        .unwrap();
        match ok.method {
            McpMethod::Initialize(p) => assert_eq!(p.client_info.name, "cli"),
            other => panic!("unexpected {:?}", other),
        }

        let missing = validate(json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": "2024-11-05"}
        }));
        assert_eq!(code(missing), codes::INVALID_PARAMS);

        let bad_version = validate(json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": 2024, "clientInfo": {"name": "cli", "version": "1.0"}}
        }));
        assert_eq!(code(bad_version), codes::INVALID_PARAMS);
    }

    #[test]
    fn test_tools_call_params() {
        let env = validate(json!({
            "jsonrpc": "2.0", "id": "x", "method": "tools/call",
            "params": {"name": "echo", "arguments": {"message": "hi"}}
        }))
        .unwrap();
        assert_eq!(
            env.method,
            McpMethod::ToolsCall(ToolCallParams {
                name: "echo".to_string(),
                arguments: Some(json!({"message": "hi"})),
            })
        );

        let no_name = validate(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {}}));
        assert_eq!(code(no_name), codes::INVALID_PARAMS);

        let bad_args = validate(json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "echo", "arguments": "hi"}
        }));
        assert_eq!(code(bad_args), codes::INVALID_PARAMS);
    }

    #[test]
    fn test_tools_list_params_must_be_object() {
        assert!(validate(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).is_ok());
        let bad = validate(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": [1]}));
        assert_eq!(code(bad), codes::INVALID_PARAMS);
    }

    #[test]
    fn test_unknown_method_and_notifications() {
        let resp = validate(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/destroy"})).unwrap_err();
        assert_eq!(resp.error().unwrap().code, codes::METHOD_NOT_FOUND);
        assert_eq!(resp.id(), Some(&RequestId::from(3)));

        let env = validate(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).unwrap();
        assert!(env.is_notification());
        assert!(env.id.is_none());
    }
}
