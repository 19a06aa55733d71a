// src/config/model.rs

use serde::Deserialize;
use serde_json::Value;

use crate::alert::{DEFAULT_ALERT_TOPIC, FailureAlertRule};
use crate::graph::{DEFINITION_VERSION, ParameterValue, StepGraph, StepType};

/// Pipeline declaration as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// name = "demo-ml-pipeline"
/// role_arn = "arn:aws:iam::123456789012:role/PipelineExecutionRole"
///
/// [[parameters]]
/// name = "InstanceType"
/// default = "ml.m5.large"
///
/// [[steps]]
/// name = "Preprocess"
/// type = "processing"
/// [steps.arguments.ProcessingResources.ClusterConfig]
/// InstanceType = { Get = "Parameters.InstanceType" }
/// ```
///
/// Parameters and steps are arrays so that declaration order is kept and
/// duplicates can be reported rather than silently merged.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineFile {
    /// `[pipeline]` section.
    pub pipeline: PipelineSection,

    /// `[alerts]` section.
    #[serde(default)]
    pub alerts: AlertSection,

    /// Optional `[experiment]` section; when present, missing fields take
    /// the execution-variable defaults.
    #[serde(default)]
    pub experiment: Option<ExperimentSection>,

    /// `[[parameters]]` entries.
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,

    /// `[[steps]]` entries, in execution order.
    #[serde(default)]
    pub steps: Vec<StepDecl>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Pipeline name; also the value of `Execution.PipelineName`.
    pub name: String,

    /// Execution role handed to the engine alongside the definition.
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Definition format version.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    DEFINITION_VERSION.to_string()
}

/// `[alerts]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertSection {
    /// Channel that failure alerts are published to.
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_topic() -> String {
    DEFAULT_ALERT_TOPIC.to_string()
}

impl Default for AlertSection {
    fn default() -> Self {
        Self {
            topic: default_topic(),
        }
    }
}

/// `[experiment]` section. Values are strings or `Get`/`Concat` tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperimentSection {
    #[serde(default)]
    pub experiment_name: Option<Value>,
    #[serde(default)]
    pub trial_name: Option<Value>,
}

/// One `[[parameters]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    pub default: ParameterValue,
}

/// One `[[steps]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StepDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub step_type: StepType,

    /// Argument tree; any string position may be a `{ Get = "..." }` or
    /// `{ Concat = [...] }` table.
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// A validated pipeline: the declaration's metadata plus a graph that has
/// passed [`StepGraph::validate`].
#[derive(Debug, Clone)]
pub struct PipelineFile {
    pub pipeline: PipelineSection,
    pub alerts: AlertSection,
    graph: StepGraph,
}

impl PipelineFile {
    /// Construct without validation. Callers must have validated `graph`.
    pub(crate) fn new_unchecked(
        pipeline: PipelineSection,
        alerts: AlertSection,
        graph: StepGraph,
    ) -> Self {
        Self {
            pipeline,
            alerts,
            graph,
        }
    }

    pub fn name(&self) -> &str {
        &self.pipeline.name
    }

    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    pub fn into_graph(self) -> StepGraph {
        self.graph
    }

    /// The failure-alert rule for this pipeline.
    pub fn alert_rule(&self) -> FailureAlertRule {
        FailureAlertRule::new(self.pipeline.name.clone()).with_topic(self.alerts.topic.clone())
    }
}
