// src/graph/argument.rs

//! Argument bundles: the nested data handed to each step.
//!
//! Any position that would hold a string may instead hold a deferred
//! reference; everything else is plain JSON-shaped data.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use super::error::GraphError;
use super::reference::{CONCAT_TAG, Expr, GET_TAG, Reference};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Argument {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Expr(Expr),
    List(Vec<Argument>),
    Map(BTreeMap<String, Argument>),
}

impl Argument {
    /// An empty argument map, the usual starting point for a step.
    pub fn empty() -> Self {
        Argument::Map(BTreeMap::new())
    }

    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Argument>,
    {
        Argument::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn list<V: Into<Argument>>(items: impl IntoIterator<Item = V>) -> Self {
        Argument::List(items.into_iter().map(Into::into).collect())
    }

    /// Look up a direct child of a map argument.
    pub fn get(&self, key: &str) -> Option<&Argument> {
        match self {
            Argument::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Argument::Expr(e) => Some(e),
            _ => None,
        }
    }

    /// Every `Get` target in the tree, in map-key order.
    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Argument::Null | Argument::Bool(_) | Argument::Number(_) => {}
            Argument::Expr(e) => e.collect_references(out),
            Argument::List(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Argument::Map(map) => {
                for value in map.values() {
                    value.collect_references(out);
                }
            }
        }
    }

    /// Reject a plain map whose only key is `Get` or `Concat`: it would
    /// serialize indistinguishably from a reference.
    pub fn check_tags(&self) -> Result<(), GraphError> {
        match self {
            Argument::Null | Argument::Bool(_) | Argument::Number(_) | Argument::Expr(_) => Ok(()),
            Argument::List(items) => items.iter().try_for_each(Argument::check_tags),
            Argument::Map(map) => {
                if map.len() == 1 {
                    if let Some((key, value)) = map.iter().next() {
                        let shown = value.to_json();
                        match key.as_str() {
                            GET_TAG => {
                                return Err(GraphError::MalformedReference(format!(
                                    "plain map {{\"Get\": {shown}}} collides with a reference tag"
                                )));
                            }
                            CONCAT_TAG => {
                                return Err(GraphError::MalformedConcat(format!(
                                    "plain map {{\"Concat\": {shown}}} collides with a reference tag"
                                )));
                            }
                            _ => {}
                        }
                    }
                }
                map.values().try_for_each(Argument::check_tags)
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Argument::Null => Value::Null,
            Argument::Bool(b) => Value::Bool(*b),
            Argument::Number(n) => Value::Number(n.clone()),
            Argument::Expr(e) => e.to_json(),
            Argument::List(items) => Value::Array(items.iter().map(Argument::to_json).collect()),
            Argument::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl TryFrom<Value> for Argument {
    type Error = GraphError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if let Some(expr) = Expr::from_json(&value)? {
            return Ok(Argument::Expr(expr));
        }

        match value {
            Value::Null => Ok(Argument::Null),
            Value::Bool(b) => Ok(Argument::Bool(b)),
            Value::Number(n) => Ok(Argument::Number(n)),
            // Strings are always picked up by `Expr::from_json`.
            Value::String(s) => Ok(Argument::Expr(Expr::Literal(s))),
            Value::Array(items) => items
                .into_iter()
                .map(Argument::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Argument::List),
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| Argument::try_from(v).map(|a| (k, a)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Argument::Map),
        }
    }
}

impl From<&Argument> for Value {
    fn from(value: &Argument) -> Self {
        value.to_json()
    }
}

impl From<Expr> for Argument {
    fn from(value: Expr) -> Self {
        Argument::Expr(value)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Expr(Expr::literal(value))
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Expr(Expr::Literal(value))
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Argument::Bool(value)
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::Number(value.into())
    }
}

impl From<u32> for Argument {
    fn from(value: u32) -> Self {
        Argument::Number(value.into())
    }
}

impl From<Vec<Argument>> for Argument {
    fn from(value: Vec<Argument>) -> Self {
        Argument::List(value)
    }
}
