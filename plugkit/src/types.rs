//! Core value types for plugkit
//!
//! Configuration and state travel between host and provider as JSON objects.
//! `Dynamic` is the in-memory form of those values, `DynamicValue` wraps it
//! with path-based accessors, and `Diagnostic` carries errors and warnings
//! back to the host.

use crate::error::{PlugError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Wire marker for a value that is not known until apply
pub const UNKNOWN_SENTINEL: &str = "__unknown__";

/// Dynamic represents any configuration or state value
/// IMPORTANT: Prefer the accessors on DynamicValue over matching directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Dynamic {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Dynamic>),
    Map(HashMap<String, Dynamic>),
    /// Value not yet known (during planning)
    Unknown,
}

impl Dynamic {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }
}

impl From<serde_json::Value> for Dynamic {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Dynamic::Null,
            Value::Bool(b) => Dynamic::Bool(b),
            Value::Number(n) => n.as_f64().map(Dynamic::Number).unwrap_or(Dynamic::Null),
            Value::String(s) if s == UNKNOWN_SENTINEL => Dynamic::Unknown,
            Value::String(s) => Dynamic::String(s),
            Value::Array(items) => Dynamic::List(items.into_iter().map(Dynamic::from).collect()),
            Value::Object(map) => Dynamic::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Dynamic::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Dynamic> for serde_json::Value {
    fn from(value: Dynamic) -> Self {
        use serde_json::Value;

        match value {
            Dynamic::Null => Value::Null,
            Dynamic::Bool(b) => Value::Bool(b),
            Dynamic::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Dynamic::String(s) => Value::String(s),
            Dynamic::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Dynamic::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
            Dynamic::Unknown => Value::String(UNKNOWN_SENTINEL.to_string()),
        }
    }
}

/// DynamicValue is the unit exchanged with the host for configs and states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl Default for DynamicValue {
    fn default() -> Self {
        Self::null()
    }
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    /// An empty object, the starting point for building state
    pub fn object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| PlugError::EncodingError(format!("json encoding failed: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        let value = serde_json::from_slice(data)
            .map_err(|e| PlugError::DecodingError(format!("json decoding failed: {}", e)))?;
        Ok(Self { value })
    }

    /// Raw access; returns None for missing attributes
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        self.navigate_path(path).ok()
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        let value = self.navigate_path(path)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PlugError::TypeMismatch {
                path: path.to_string(),
                expected: "string".to_string(),
                actual: value.type_name().to_string(),
            })
    }

    pub fn set_string(&mut self, path: &AttributePath, value: impl Into<String>) -> Result<()> {
        self.set(path, Dynamic::String(value.into()))
    }

    /// Set a value, creating intermediate objects as needed
    pub fn set(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = new_value;
            return Ok(());
        };

        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for step in parents {
            current = match current {
                Dynamic::Map(m) => m
                    .entry(step.clone())
                    .or_insert_with(|| Dynamic::Map(HashMap::new())),
                other => {
                    return Err(PlugError::TypeMismatch {
                        path: path.to_string(),
                        expected: "map".to_string(),
                        actual: other.type_name().to_string(),
                    })
                }
            };
        }

        match current {
            Dynamic::Map(m) => {
                m.insert(last.clone(), new_value);
                Ok(())
            }
            other => Err(PlugError::TypeMismatch {
                path: path.to_string(),
                expected: "map".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Top-level attributes when the value is an object
    pub fn attributes(&self) -> Option<&HashMap<String, Dynamic>> {
        match &self.value {
            Dynamic::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    fn navigate_path<'a>(&'a self, path: &AttributePath) -> Result<&'a Dynamic> {
        let mut current = &self.value;

        for step in &path.steps {
            current = match current {
                Dynamic::Map(m) => m
                    .get(step)
                    .ok_or_else(|| PlugError::AttributeNotFound(path.to_string()))?,
                _ => return Err(PlugError::AttributeNotFound(path.to_string())),
            };
        }

        Ok(current)
    }
}

/// AttributePath addresses an attribute inside a DynamicValue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributePath {
    pub steps: Vec<String>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![name.to_string()],
        }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps.push(name.to_string());
        self
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.steps.join("."))
    }
}

/// Diagnostic represents a warning or error from the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// True when any diagnostic in the slice is an error
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_value_string_access() {
        let mut dv = DynamicValue::object();
        dv.set_string(&AttributePath::new("name"), "test").unwrap();

        let result = dv.get_string(&AttributePath::new("name")).unwrap();
        assert_eq!(result, "test");
    }

    #[test]
    fn dynamic_value_nested_access() {
        let mut dv = DynamicValue::null();
        let path = AttributePath::new("config").attribute("path");
        dv.set_string(&path, "/tmp/out.txt").unwrap();

        assert_eq!(dv.get_string(&path).unwrap(), "/tmp/out.txt");
    }

    #[test]
    fn missing_attribute_is_reported_with_path() {
        let dv = DynamicValue::object();
        let err = dv.get_string(&AttributePath::new("filename")).unwrap_err();
        assert!(matches!(err, PlugError::AttributeNotFound(p) if p == "filename"));
    }

    #[test]
    fn type_mismatch_names_both_types() {
        let mut dv = DynamicValue::object();
        dv.set(&AttributePath::new("content"), Dynamic::Bool(true))
            .unwrap();

        let err = dv.get_string(&AttributePath::new("content")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type mismatch at content: expected string, got bool"
        );
    }

    #[test]
    fn unknown_sentinel_survives_json() {
        let mut dv = DynamicValue::object();
        dv.set(&AttributePath::new("hash"), Dynamic::Unknown).unwrap();

        let encoded = dv.encode_json().unwrap();
        assert_eq!(encoded, br#"{"hash":"__unknown__"}"#.to_vec());

        let decoded = DynamicValue::decode_json(&encoded).unwrap();
        assert!(decoded
            .get(&AttributePath::new("hash"))
            .is_some_and(Dynamic::is_unknown));
    }

    #[test]
    fn diagnostics_error_detection() {
        let diags = vec![
            Diagnostic::warning("heads up", ""),
            Diagnostic::error("broken", "details"),
        ];
        assert!(has_errors(&diags));
        assert!(!has_errors(&diags[..1]));
    }
}
