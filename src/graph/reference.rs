// src/graph/reference.rs

//! Deferred references: the `Get` / `Concat` expression language.
//!
//! On the wire a reference is a single-key object:
//!
//! ```json
//! {"Get": "Parameters.InputDataUri"}
//! {"Get": "Steps.Preprocess.ProcessingOutputConfig.Outputs['train'].S3Output.S3Uri"}
//! {"Concat": ["s3://", {"Get": "Parameters.Bucket"}, "/models"]}
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::error::GraphError;

pub const GET_TAG: &str = "Get";
pub const CONCAT_TAG: &str = "Concat";

const PARAMETERS_NS: &str = "Parameters";
const STEPS_NS: &str = "Steps";
const EXECUTION_NS: &str = "Execution";

/// Variables the execution engine provides for every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExecutionVariable {
    PipelineName,
    PipelineExecutionId,
    PipelineExecutionArn,
    StartDateTime,
    CurrentDateTime,
}

impl ExecutionVariable {
    pub const ALL: [ExecutionVariable; 5] = [
        ExecutionVariable::PipelineName,
        ExecutionVariable::PipelineExecutionId,
        ExecutionVariable::PipelineExecutionArn,
        ExecutionVariable::StartDateTime,
        ExecutionVariable::CurrentDateTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionVariable::PipelineName => "PipelineName",
            ExecutionVariable::PipelineExecutionId => "PipelineExecutionId",
            ExecutionVariable::PipelineExecutionArn => "PipelineExecutionArn",
            ExecutionVariable::StartDateTime => "StartDateTime",
            ExecutionVariable::CurrentDateTime => "CurrentDateTime",
        }
    }
}

impl FromStr for ExecutionVariable {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExecutionVariable::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                GraphError::MalformedReference(format!("unknown execution variable '{s}'"))
            })
    }
}

/// The target of a `Get`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// `Parameters.<name>`
    Parameter(String),
    /// `Steps.<step>.<attribute>`; the attribute path is kept verbatim.
    StepOutput { step: String, attribute: String },
    /// `Execution.<variable>`
    Execution(ExecutionVariable),
}

impl Reference {
    /// Parse a dotted `Get` path.
    pub fn parse(path: &str) -> Result<Self, GraphError> {
        let malformed = |why: &str| GraphError::MalformedReference(format!("'{path}': {why}"));

        let (namespace, rest) = path
            .split_once('.')
            .ok_or_else(|| malformed("expected <Namespace>.<name>"))?;
        if rest.is_empty() {
            return Err(malformed("empty name"));
        }

        match namespace {
            PARAMETERS_NS => Ok(Reference::Parameter(rest.to_string())),
            STEPS_NS => {
                let (step, attribute) = rest
                    .split_once('.')
                    .ok_or_else(|| malformed("expected Steps.<step>.<attribute>"))?;
                if step.is_empty() || attribute.is_empty() {
                    return Err(malformed("expected Steps.<step>.<attribute>"));
                }
                Ok(Reference::StepOutput {
                    step: step.to_string(),
                    attribute: attribute.to_string(),
                })
            }
            EXECUTION_NS => Ok(Reference::Execution(rest.parse()?)),
            other => Err(malformed(&format!("unknown namespace '{other}'"))),
        }
    }

    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Parameter(name) => write!(f, "{PARAMETERS_NS}.{name}"),
            Reference::StepOutput { step, attribute } => {
                write!(f, "{STEPS_NS}.{step}.{attribute}")
            }
            Reference::Execution(var) => write!(f, "{EXECUTION_NS}.{}", var.as_str()),
        }
    }
}

/// A string-valued expression: a literal or a deferred reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Get(Reference),
    Concat(Vec<Expr>),
}

impl Expr {
    pub fn literal(value: impl Into<String>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Expr::Get(Reference::Parameter(name.into()))
    }

    pub fn step_output(step: impl Into<String>, attribute: impl Into<String>) -> Self {
        Expr::Get(Reference::StepOutput {
            step: step.into(),
            attribute: attribute.into(),
        })
    }

    pub fn execution(var: ExecutionVariable) -> Self {
        Expr::Get(Reference::Execution(var))
    }

    pub fn concat(parts: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Concat(parts.into_iter().collect())
    }

    /// True for anything other than a plain literal.
    pub fn is_deferred(&self) -> bool {
        !matches!(self, Expr::Literal(_))
    }

    /// Every `Get` target, depth-first, left-to-right.
    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    pub(crate) fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Get(r) => out.push(r),
            Expr::Concat(parts) => {
                for part in parts {
                    part.collect_references(out);
                }
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expr::Literal(s) => Value::String(s.clone()),
            Expr::Get(r) => tagged(GET_TAG, Value::String(r.path())),
            Expr::Concat(parts) => tagged(
                CONCAT_TAG,
                Value::Array(parts.iter().map(Expr::to_json).collect()),
            ),
        }
    }

    /// Interpret a JSON value as an expression.
    ///
    /// Returns `Ok(None)` when the value is not string-shaped at all (a number,
    /// a list, or a map that is not a reference tag), so callers can treat it
    /// as ordinary data.
    pub fn from_json(value: &Value) -> Result<Option<Self>, GraphError> {
        match value {
            Value::String(s) => Ok(Some(Expr::Literal(s.clone()))),
            Value::Object(map) => match single_tag(map) {
                Some((GET_TAG, inner)) => parse_get(inner).map(Some),
                Some((CONCAT_TAG, inner)) => parse_concat(inner).map(Some),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(s) => write!(f, "{s:?}"),
            Expr::Get(r) => write!(f, "Get({r})"),
            Expr::Concat(parts) => {
                write!(f, "Concat(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(value)
    }
}

impl From<Reference> for Expr {
    fn from(value: Reference) -> Self {
        Expr::Get(value)
    }
}

fn tagged(tag: &str, inner: Value) -> Value {
    let mut map = Map::new();
    map.insert(tag.to_string(), inner);
    Value::Object(map)
}

/// `Some((tag, inner))` when `map` is exactly `{"Get": ..}` or `{"Concat": ..}`.
pub(crate) fn single_tag(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    match key.as_str() {
        GET_TAG => Some((GET_TAG, inner)),
        CONCAT_TAG => Some((CONCAT_TAG, inner)),
        _ => None,
    }
}

fn parse_get(inner: &Value) -> Result<Expr, GraphError> {
    match inner {
        Value::String(path) => Ok(Expr::Get(Reference::parse(path)?)),
        other => Err(GraphError::MalformedReference(format!(
            "Get expects a path string, got {other}"
        ))),
    }
}

fn parse_concat(inner: &Value) -> Result<Expr, GraphError> {
    let Value::Array(items) = inner else {
        return Err(GraphError::MalformedConcat(format!(
            "Concat expects a list, got {inner}"
        )));
    };

    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match Expr::from_json(item)? {
            Some(expr) => parts.push(expr),
            None => {
                return Err(GraphError::MalformedConcat(format!(
                    "{item} is neither a string literal nor a reference"
                )));
            }
        }
    }
    Ok(Expr::Concat(parts))
}
