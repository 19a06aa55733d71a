// src/graph/error.rs

use thiserror::Error;

use super::parameter::ParameterType;

/// Local, synchronous failures raised while building, validating or
/// resolving a step graph.
///
/// None of these are retryable: they describe a static declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("parameter '{0}' is already declared")]
    DuplicateParameter(String),

    #[error("step '{0}' is already declared")]
    DuplicateStepName(String),

    /// A `Get` names a step that is not declared earlier, or a parameter
    /// that is not declared at all.
    #[error("{location} references unknown '{reference}'")]
    UnknownReference { location: String, reference: String },

    /// Dry-run only: the referenced step has not recorded this attribute.
    #[error("step '{step}' has no recorded output '{attribute}'")]
    MissingOutput { step: String, attribute: String },

    #[error("malformed Concat entry: {0}")]
    MalformedConcat(String),

    #[error("malformed Get reference: {0}")]
    MalformedReference(String),

    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },

    #[error("parameter '{name}' has a non-finite default")]
    NonFiniteDefault { name: String },

    #[error("parameter '{name}' is declared as {declared} but its default is {found}")]
    MismatchedParameterType {
        name: String,
        declared: ParameterType,
        found: ParameterType,
    },
}
