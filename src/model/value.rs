//! Dynamic values flowing through bindings

use std::fmt;

use serde_json::Value as Json;

use super::{CommandRef, NodeRef, ObjectRef};

/// A value read from or written to a bound member.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    /// Plain data (numbers, text, booleans, structured JSON)
    Data(Json),
    /// A bindable object (view-model, appended sub-object)
    Object(ObjectRef),
    /// A UI node reference (source-reference wiring)
    Node(NodeRef),
    /// A command-interface object
    Command(CommandRef),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Any,
            Value::Data(Json::Bool(_)) => ValueKind::Bool,
            Value::Data(Json::Number(_)) => ValueKind::Number,
            Value::Data(Json::String(_)) => ValueKind::Text,
            Value::Data(_) => ValueKind::Any,
            Value::Object(_) => ValueKind::Object,
            Value::Node(_) => ValueKind::Node,
            Value::Command(_) => ValueKind::Command,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Data(Json::Null))
    }

    /// Truthiness used by can-execute properties: `false`, `null`, `0` and
    /// `""` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Data(json) => match json {
                Json::Null => false,
                Json::Bool(b) => *b,
                Json::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
                Json::String(s) => !s.is_empty(),
                Json::Array(_) | Json::Object(_) => true,
            },
            Value::Object(_) | Value::Node(_) | Value::Command(_) => true,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_command(&self) -> Option<&CommandRef> {
        match self {
            Value::Command(command) => Some(command),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Json> {
        match self {
            Value::Data(json) => Some(json),
            _ => None,
        }
    }

    /// JSON view of the value for reports. Non-data values render as a tag.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Data(json) => json.clone(),
            Value::Object(object) => Json::String(format!("<object {}>", object.type_info().name)),
            Value::Node(node) => Json::String(format!(
                "<node {}>",
                node.declared_name().unwrap_or_else(|| node.type_info().name)
            )),
            Value::Command(_) => Json::String("<command>".to_string()),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::Data(json)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Data(Json::String(text.to_string()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(Json::Bool(b))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => super::same_object(a, b),
            (Value::Node(a), Value::Node(b)) => super::same_node(a, b),
            (Value::Command(a), Value::Command(b)) => std::rc::Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Data(json) => write!(f, "Data({json})"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// Type tag carried by member descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Any,
    Bool,
    Number,
    Text,
    Object,
    Node,
    Command,
}

impl ValueKind {
    /// Whether a value can be stored in a member tagged with this kind.
    ///
    /// `Null` is accepted everywhere.
    pub fn accepts(self, value: &Value) -> bool {
        if value.is_null() || self == ValueKind::Any {
            return true;
        }
        value.kind() == self
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Any => "any",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::Object => "object",
            ValueKind::Node => "node",
            ValueKind::Command => "command",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds() {
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
        assert_eq!(Value::from(json!(3)).kind(), ValueKind::Number);
        assert_eq!(Value::from("hi").kind(), ValueKind::Text);
        assert_eq!(Value::Null.kind(), ValueKind::Any);
    }

    #[test]
    fn accepts() {
        assert!(ValueKind::Bool.accepts(&Value::from(false)));
        assert!(!ValueKind::Bool.accepts(&Value::from("false")));
        assert!(ValueKind::Text.accepts(&Value::Null));
        assert!(ValueKind::Any.accepts(&Value::from(json!([1, 2]))));
        assert!(!ValueKind::Number.accepts(&Value::from(json!({"a": 1}))));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(!Value::from(json!(0)).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(json!(2)).is_truthy());
        assert!(Value::from("x").is_truthy());
    }
}
