use serde_json::Value;
use std::sync::Arc;

use crate::types::{RawFlagResult, Variable};

/// Query object over a resolved flag.
///
/// Cloning is cheap; clones share the same payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagResult {
    raw: Arc<RawFlagResult>,
}

impl FlagResult {
    pub fn wrap(raw: RawFlagResult) -> Self {
        Self { raw: Arc::new(raw) }
    }

    pub fn from_shared(raw: Arc<RawFlagResult>) -> Self {
        Self { raw }
    }

    /// Disabled flag without variables.
    pub fn disabled() -> Self {
        Self::wrap(RawFlagResult::disabled())
    }

    /// The enabled payload exactly as the backend sent it.
    pub fn is_enabled(&self) -> &Value {
        &self.raw.is_enabled
    }

    /// `true` only when the backend reported a boolean `true`.
    pub fn is_enabled_bool(&self) -> bool {
        matches!(self.raw.is_enabled, Value::Bool(true))
    }

    /// First variable whose key matches `key` exactly.
    pub fn find_variable(&self, key: &str) -> Option<&Variable> {
        self.raw.variables.iter().find(|variable| variable.key == key)
    }

    /// Value of the first variable named `key`.
    ///
    /// Returns `default_value` when no variable matches or the match has no
    /// value. An explicit `null` is returned as `null`.
    pub fn get_variable(&self, key: &str, default_value: impl Into<Value>) -> Value {
        match self.find_variable(key) {
            Some(Variable {
                value: Some(value), ..
            }) => value.clone(),
            _ => default_value.into(),
        }
    }

    /// All variables in backend order.
    pub fn get_variables(&self) -> &[Variable] {
        &self.raw.variables
    }

    pub fn get_string(&self, key: &str, default_value: &str) -> String {
        self.present_value(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| default_value.to_string())
    }

    pub fn get_bool(&self, key: &str, default_value: bool) -> bool {
        self.present_value(key)
            .and_then(Value::as_bool)
            .unwrap_or(default_value)
    }

    pub fn get_number(&self, key: &str, default_value: f64) -> f64 {
        self.present_value(key)
            .and_then(Value::as_f64)
            .unwrap_or(default_value)
    }

    /// Integer value; fractional numbers are truncated.
    pub fn get_int(&self, key: &str, default_value: i64) -> i64 {
        match self.present_value(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(default_value),
            _ => default_value,
        }
    }

    pub fn raw(&self) -> &RawFlagResult {
        &self.raw
    }

    fn present_value(&self, key: &str) -> Option<&Value> {
        self.find_variable(key).and_then(|variable| variable.value.as_ref())
    }
}

impl From<RawFlagResult> for FlagResult {
    fn from(raw: RawFlagResult) -> Self {
        Self::wrap(raw)
    }
}
