//! Argument normalization
//!
//! Callers reach the tools through several front-ends that grew different
//! argument spellings over time. Every accepted spelling is translated here,
//! once, into the canonical command parameters.

use pagepilot_core::wire::InputValue;
use pagepilot_core::ElementKind;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Tool arguments as received
pub type Args = Map<String, Value>;

/// Turn raw `arguments` into an object. Missing or `null` means empty.
pub fn into_object(arguments: Option<Value>) -> Result<Args> {
    match arguments {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(Error::InvalidArguments(format!(
            "arguments must be an object, got {}",
            type_name(&other)
        ))),
    }
}

/// `sessionId` | `session_id`
pub fn session_id(args: &Args) -> Result<Option<String>> {
    optional_string(args, &["sessionId", "session_id"])
}

/// First present alias as a string. `null` counts as absent.
pub fn optional_string(args: &Args, aliases: &[&'static str]) -> Result<Option<String>> {
    match first_present(args, aliases) {
        None => Ok(None),
        Some((_, Value::String(s))) => Ok(Some(s.clone())),
        Some((key, other)) => Err(Error::InvalidArguments(format!(
            "{} must be a string, got {}",
            key,
            type_name(other)
        ))),
    }
}

/// First present alias as a non-empty string.
pub fn required_string(args: &Args, aliases: &[&'static str]) -> Result<String> {
    match optional_string(args, aliases)? {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Error::InvalidArguments(format!(
            "{} is required",
            aliases.first().copied().unwrap_or("argument")
        ))),
    }
}

/// `elementType` for `getElements`, default `clickable`.
pub fn element_kind(args: &Args) -> Result<ElementKind> {
    match optional_string(args, &["elementType"])? {
        None => Ok(ElementKind::default()),
        Some(kind) => kind.parse().map_err(Error::InvalidArguments),
    }
}

/// `data` | `value`: strings and booleans pass through, numbers become text.
pub fn input_value(args: &Args) -> Result<InputValue> {
    match first_present(args, &["data", "value"]) {
        Some((_, Value::String(s))) => Ok(InputValue::Text(s.clone())),
        Some((_, Value::Bool(b))) => Ok(InputValue::Flag(*b)),
        Some((_, Value::Number(n))) => Ok(InputValue::Text(n.to_string())),
        Some((key, other)) => Err(Error::InvalidArguments(format!(
            "{} must be a string, boolean or number, got {}",
            key,
            type_name(other)
        ))),
        None => Err(Error::InvalidArguments("data is required".to_string())),
    }
}

fn first_present<'a>(args: &'a Args, aliases: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    aliases
        .iter()
        .find_map(|key| match args.get(*key) {
            None | Some(Value::Null) => None,
            Some(value) => Some((*key, value)),
        })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Args {
        into_object(Some(value)).unwrap()
    }

    #[test]
    fn test_into_object() {
        assert!(into_object(None).unwrap().is_empty());
        assert!(into_object(Some(Value::Null)).unwrap().is_empty());
        assert!(matches!(
            into_object(Some(json!([1, 2]))),
            Err(Error::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_session_id_aliases() {
        assert_eq!(
            session_id(&obj(json!({"session_id": "tab-1"}))).unwrap().as_deref(),
            Some("tab-1")
        );
        assert_eq!(
            session_id(&obj(json!({"sessionId": "a", "session_id": "b"}))).unwrap().as_deref(),
            Some("a")
        );
        assert!(session_id(&obj(json!({}))).unwrap().is_none());
        assert!(session_id(&obj(json!({"sessionId": 7}))).is_err());
    }

    #[test]
    fn test_element_name_aliases() {
        let aliases = ["elementName", "inputName", "name"];
        assert_eq!(
            required_string(&obj(json!({"inputName": "user-email"})), &aliases).unwrap(),
            "user-email"
        );
        assert_eq!(
            required_string(&obj(json!({"name": "submit-btn", "elementName": null})), &aliases).unwrap(),
            "submit-btn"
        );
        let err = required_string(&obj(json!({})), &aliases).unwrap_err();
        assert_eq!(err.to_string(), "invalid arguments: elementName is required");
    }

    #[test]
    fn test_input_value_coercion() {
        assert_eq!(
            input_value(&obj(json!({"value": "hi"}))).unwrap(),
            InputValue::Text("hi".to_string())
        );
        assert_eq!(input_value(&obj(json!({"data": true}))).unwrap(), InputValue::Flag(true));
        assert_eq!(
            input_value(&obj(json!({"value": 2}))).unwrap(),
            InputValue::Text("2".to_string())
        );
        assert!(input_value(&obj(json!({"data": {"x": 1}}))).is_err());
        assert!(input_value(&obj(json!({}))).is_err());
    }

    #[test]
    fn test_element_kind_default_and_rejection() {
        assert_eq!(element_kind(&obj(json!({}))).unwrap(), ElementKind::Clickable);
        assert_eq!(element_kind(&obj(json!({"elementType": "input"}))).unwrap(), ElementKind::Input);
        assert!(element_kind(&obj(json!({"elementType": "links"}))).is_err());
    }
}
