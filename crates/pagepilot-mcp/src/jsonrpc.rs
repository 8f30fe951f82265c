//! JSON-RPC 2.0 envelope types.
//!
//! A response carries exactly one of `result` or `error`; the payload enum is
//! flattened into the object, so no other shape can be built or serialized.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Protocol version tag
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard error codes
pub mod codes {
    /// Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method does not exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Request id: string, number or explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id, kept as the caller wrote it
    Number(serde_json::Number),
    /// String id
    String(String),
    /// Explicit `null`
    Null,
}

impl RequestId {
    /// Recover an id from a raw value; `None` if the value is not a valid id.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// A field that is present, even as `null`, deserializes to `Some`.
fn present<'de, D>(deserializer: D) -> Result<Option<RequestId>, D::Error>
where
    D: Deserializer<'de>,
{
    RequestId::deserialize(deserializer).map(Some)
}

/// JSON-RPC request or notification, after validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Absent for notifications
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    /// Build a request
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Short description
    pub message: String,
    /// Optional detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Payload {
    Result(Value),
    Error(JsonRpcError),
}

/// JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
    #[serde(flatten)]
    payload: Payload,
}

impl JsonRpcResponse {
    /// Successful response. `id: None` omits the field.
    #[must_use]
    pub fn ok(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: Payload::Result(result),
        }
    }

    /// Error response. `id: None` omits the field.
    #[must_use]
    pub fn err(id: Option<RequestId>, code: i32, message: impl Into<String>) -> Self {
        Self::err_with_data(id, code, message, None)
    }

    /// Error response with a `data` member
    #[must_use]
    pub fn err_with_data(
        id: Option<RequestId>,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: Payload::Error(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Response id
    #[must_use]
    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// Result member, if successful
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Result(value) => Some(value),
            Payload::Error(_) => None,
        }
    }

    /// Error member, if failed
    #[must_use]
    pub fn error(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            Payload::Result(_) => None,
            Payload::Error(err) => Some(err),
        }
    }

    /// Whether this is an error response
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.payload, Payload::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_ok_shape() {
        let resp = JsonRpcResponse::ok(Some(1.into()), json!({"tools": []}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}}));
    }

    #[test]
    fn test_response_err_shape() {
        let resp = JsonRpcResponse::err(Some(RequestId::Null), codes::PARSE_ERROR, "Parse error");
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})
        );
        assert!(resp.is_error());
        assert!(resp.result().is_none());
    }

    #[test]
    fn test_id_omitted_when_not_supplied() {
        let resp = JsonRpcResponse::ok(None, json!({}));
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_null_id_survives_round_trip() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"result":{}}"#).unwrap();
        assert_eq!(resp.id(), Some(&RequestId::Null));

        let req: JsonRpcRequest = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert!(req.id.is_none());
    }

    #[test]
    fn test_numeric_id_kept_verbatim() {
        let id = RequestId::from_value(&json!(1.5)).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "1.5");
        assert_eq!(RequestId::from_value(&json!("abc")), Some("abc".into()));
        assert!(RequestId::from_value(&json!({"x": 1})).is_none());
    }
}
