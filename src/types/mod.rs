use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, ErrorCode, Result};

/// Open-ended, insertion-ordered property map crossing the bridge.
pub type Attributes = serde_json::Map<String, Value>;

/// Maximum nesting of objects/arrays accepted in a payload map.
pub const MAX_PAYLOAD_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Parses a level name case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "TRACE" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Error
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A log record emitted by the native backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
    #[serde(rename = "type")]
    pub level: LogLevel,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }
}

/// The subject of flag evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom_variables: Attributes,
}

impl UserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            custom_variables: Attributes::new(),
        }
    }

    pub fn custom_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_variables.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.custom_variables.is_empty()
    }
}

/// One resolved variable of a flag.
///
/// `value` is `None` when the backend provided no value at all, and
/// `Some(Value::Null)` when it provided an explicit null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    #[serde(rename = "type", default)]
    pub variable_type: String,
    #[serde(default)]
    pub id: i64,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let variable_type = json_type_name(&value).to_string();
        Self {
            key: key.into(),
            value: Some(value),
            variable_type,
            id: 0,
        }
    }

    /// A variable the backend declared without providing a value.
    pub fn without_value(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            variable_type: String::new(),
            id: 0,
        }
    }

    pub fn with_type(mut self, variable_type: impl Into<String>) -> Self {
        self.variable_type = variable_type.into();
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }
}

// A present field, even `null`, deserializes to `Some`; only a missing
// field falls back to `#[serde(default)]`.
fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A flag payload exactly as the backend resolved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlagResult {
    #[serde(default = "default_is_enabled")]
    pub is_enabled: Value,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

fn default_is_enabled() -> Value {
    Value::Bool(false)
}

impl RawFlagResult {
    pub fn new(is_enabled: bool, variables: Vec<Variable>) -> Self {
        Self {
            is_enabled: Value::Bool(is_enabled),
            variables,
        }
    }

    /// The payload served by a fallback instance: disabled, no variables.
    pub fn disabled() -> Self {
        Self::new(false, Vec::new())
    }
}

/// Reject payloads nested deeper than `max_depth` objects/arrays.
pub fn check_depth(attributes: &Attributes, max_depth: usize) -> Result<()> {
    fn depth_of(value: &Value) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Value, usize)> = vec![(value, 0)];
        while let Some((value, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match value {
                Value::Array(items) => stack.extend(items.iter().map(|v| (v, depth + 1))),
                Value::Object(map) => stack.extend(map.values().map(|v| (v, depth + 1))),
                _ => {}
            }
        }
        deepest
    }

    let depth = attributes.values().map(depth_of).max().unwrap_or(0) + 1;
    if depth > max_depth {
        return Err(BridgeError::new(
            ErrorCode::PayloadTooDeep,
            format!("Payload nesting depth {} exceeds the limit of {}", depth, max_depth),
        ));
    }
    Ok(())
}
