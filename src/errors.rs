// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::graph::GraphError;

#[derive(Error, Debug)]
pub enum StepgraphError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Every violation found while validating a declared or parsed graph.
    #[error("Invalid step graph: {} violation(s), first: {}", .0.len(), first_violation(.0))]
    InvalidGraph(Vec<GraphError>),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Cycle detected in step dependencies: {0}")]
    DependencyCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn first_violation(violations: &[GraphError]) -> String {
    violations
        .first()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string())
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StepgraphError>;
