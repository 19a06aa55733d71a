// src/graph/step.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::argument::Argument;
use super::reference::Reference;

/// The fixed set of step kinds understood by the execution engine.
///
/// Serialized with the engine's names; declarations may also use the
/// lower/kebab-case spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepType {
    #[serde(alias = "processing")]
    Processing,
    #[serde(alias = "training")]
    Training,
    #[serde(alias = "model", alias = "create-model", alias = "CreateModel")]
    Model,
    #[serde(alias = "endpoint-config")]
    EndpointConfig,
    #[serde(alias = "endpoint")]
    Endpoint,
}

impl StepType {
    pub const ALL: [StepType; 5] = [
        StepType::Processing,
        StepType::Training,
        StepType::Model,
        StepType::EndpointConfig,
        StepType::Endpoint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Processing => "Processing",
            StepType::Training => "Training",
            StepType::Model => "Model",
            StepType::EndpointConfig => "EndpointConfig",
            StepType::Endpoint => "Endpoint",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "processing" => Ok(StepType::Processing),
            "training" => Ok(StepType::Training),
            "model" | "create-model" | "createmodel" => Ok(StepType::Model),
            "endpoint-config" | "endpointconfig" => Ok(StepType::EndpointConfig),
            "endpoint" => Ok(StepType::Endpoint),
            other => Err(format!(
                "invalid step type: {other} (expected one of processing, training, model, endpoint-config, endpoint)"
            )),
        }
    }
}

/// A named node of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub step_type: StepType,
    pub arguments: Argument,
}

impl Step {
    pub fn new(name: impl Into<String>, step_type: StepType, arguments: Argument) -> Self {
        Self {
            name: name.into(),
            step_type,
            arguments,
        }
    }

    pub fn references(&self) -> Vec<&Reference> {
        self.arguments.references()
    }

    /// Names of the steps this one reads outputs from, first mention first.
    pub fn upstream_steps(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for r in self.references() {
            if let Reference::StepOutput { step, .. } = r {
                if !out.contains(&step.as_str()) {
                    out.push(step.as_str());
                }
            }
        }
        out
    }
}
