// src/graph/parameter.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a pipeline parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "String",
            ParameterType::Integer => "Integer",
            ParameterType::Float => "Float",
            ParameterType::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter's default (or bound) value.
///
/// Untagged so that both TOML and JSON write it as a bare scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl ParameterValue {
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            ParameterValue::Boolean(_) => ParameterType::Boolean,
            ParameterValue::Integer(_) => ParameterType::Integer,
            ParameterValue::Float(_) => ParameterType::Float,
            ParameterValue::String(_) => ParameterType::String,
        }
    }

    /// Reinterpret the value as `ty` where that loses nothing
    /// (an integer default for a `Float` parameter).
    pub fn coerce(self, ty: ParameterType) -> Option<ParameterValue> {
        match (self, ty) {
            (v, t) if v.parameter_type() == t => Some(v),
            (ParameterValue::Integer(i), ParameterType::Float) => {
                Some(ParameterValue::Float(i as f64))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Boolean(b) => write!(f, "{b}"),
            ParameterValue::Integer(i) => write!(f, "{i}"),
            ParameterValue::Float(x) => write!(f, "{x}"),
            ParameterValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Float(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Boolean(value)
    }
}

/// A named value substitutable at execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: ParameterValue,
}

impl Parameter {
    pub fn parameter_type(&self) -> ParameterType {
        self.default.parameter_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_coerces_to_float_only() {
        assert_eq!(
            ParameterValue::Integer(2).coerce(ParameterType::Float),
            Some(ParameterValue::Float(2.0))
        );
        assert_eq!(ParameterValue::Integer(2).coerce(ParameterType::String), None);
        assert_eq!(
            ParameterValue::from("x").coerce(ParameterType::String),
            Some(ParameterValue::from("x"))
        );
    }

    #[test]
    fn display_renders_bare_values() {
        assert_eq!(ParameterValue::from("ml.m5.large").to_string(), "ml.m5.large");
        assert_eq!(ParameterValue::from(3_i64).to_string(), "3");
        assert_eq!(ParameterValue::from(true).to_string(), "true");
    }
}
