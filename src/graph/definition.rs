// src/graph/definition.rs

//! The step graph itself: builder operations, validation and the transport
//! format.
//!
//! The transport format is what the execution engine consumes:
//!
//! ```json
//! {
//!   "Version": "2020-12-01",
//!   "Metadata": {},
//!   "Parameters": [{"Name": "InstanceType", "Type": "String", "DefaultValue": "ml.m5.large"}],
//!   "PipelineExperimentConfig": {
//!     "ExperimentName": {"Get": "Execution.PipelineName"},
//!     "TrialName": {"Get": "Execution.PipelineExecutionId"}
//!   },
//!   "Steps": [{"Name": "Preprocess", "Type": "Processing", "Arguments": {}}]
//! }
//! ```

use std::collections::{BTreeSet, HashSet};

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use super::argument::Argument;
use super::error::GraphError;
use super::names::check_name;
use super::parameter::{Parameter, ParameterType, ParameterValue};
use super::reference::{ExecutionVariable, Expr, Reference};
use super::step::{Step, StepType};
use crate::errors::Result;

/// Definition format version written when none is given.
pub const DEFINITION_VERSION: &str = "2020-12-01";

/// Experiment/trial metadata attached to every execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub experiment_name: Expr,
    pub trial_name: Expr,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiment_name: Expr::execution(ExecutionVariable::PipelineName),
            trial_name: Expr::execution(ExecutionVariable::PipelineExecutionId),
        }
    }
}

impl ExperimentConfig {
    fn references(&self) -> Vec<&Reference> {
        let mut out = self.experiment_name.references();
        out.extend(self.trial_name.references());
        out
    }
}

/// An ordered, linear sequence of typed steps plus their parameters.
///
/// Built through [`StepGraph::add_parameter`] / [`StepGraph::add_step`],
/// which reject anything that would break the graph's invariants, or
/// reconstructed from the transport format via [`StepGraph::parse`], which
/// does not; call [`StepGraph::validate`] on parsed graphs.
#[derive(Debug, Clone, PartialEq)]
pub struct StepGraph {
    version: String,
    parameters: Vec<Parameter>,
    steps: Vec<Step>,
    experiment: Option<ExperimentConfig>,
}

impl Default for StepGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl StepGraph {
    pub fn new() -> Self {
        Self {
            version: DEFINITION_VERSION.to_string(),
            parameters: Vec::new(),
            steps: Vec::new(),
            experiment: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Assemble a graph without checking anything.
    pub(crate) fn from_parts(
        version: String,
        parameters: Vec<Parameter>,
        steps: Vec<Step>,
        experiment: Option<ExperimentConfig>,
    ) -> Self {
        Self {
            version,
            parameters,
            steps,
            experiment,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Steps in declaration (= execution) order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn experiment(&self) -> Option<&ExperimentConfig> {
        self.experiment.as_ref()
    }

    // -----------------------------------------------------------------------
    // Builder operations
    // -----------------------------------------------------------------------

    /// Register a parameter with its default value.
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        default: impl Into<ParameterValue>,
    ) -> std::result::Result<&Parameter, GraphError> {
        let name = name.into();
        if self.parameter(&name).is_some() {
            return Err(GraphError::DuplicateParameter(name));
        }
        check_name("parameter", &name)?;
        let default = default.into();
        check_default(&name, &default)?;

        debug!(parameter = %name, "adding parameter");
        let idx = self.parameters.len();
        self.parameters.push(Parameter { name, default });
        Ok(&self.parameters[idx])
    }

    /// Append a step.
    ///
    /// Every `Get` in `arguments` must name a declared parameter or a step
    /// added before this one. On error the graph is left unchanged.
    pub fn add_step(
        &mut self,
        name: impl Into<String>,
        step_type: StepType,
        arguments: Argument,
    ) -> std::result::Result<&Step, GraphError> {
        let name = name.into();
        if self.step(&name).is_some() {
            return Err(GraphError::DuplicateStepName(name));
        }
        check_name("step", &name)?;
        arguments.check_tags()?;

        let step = Step::new(name, step_type, arguments);
        {
            let scope = Scope::new(&self.parameters, &self.steps);
            let location = format!("step '{}'", step.name);
            for reference in step.references() {
                scope.check(&location, reference)?;
            }
        }

        debug!(step = %step.name, step_type = %step.step_type, "adding step");
        let idx = self.steps.len();
        self.steps.push(step);
        Ok(&self.steps[idx])
    }

    /// Attach experiment metadata. Its expressions may only reference
    /// parameters and execution variables.
    pub fn set_experiment(
        &mut self,
        config: ExperimentConfig,
    ) -> std::result::Result<(), GraphError> {
        let scope = Scope::new(&self.parameters, &[]);
        for reference in config.references() {
            scope.check("experiment config", reference)?;
        }
        self.experiment = Some(config);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check names, uniqueness and reference scoping without executing
    /// anything. Returns every violation found, in declaration order; an
    /// empty list means the graph is valid.
    pub fn validate(&self) -> Vec<GraphError> {
        let mut violations = Vec::new();

        let mut param_names: HashSet<&str> = HashSet::new();
        for p in &self.parameters {
            if let Err(e) = check_name("parameter", &p.name) {
                violations.push(e);
            }
            if let Err(e) = check_default(&p.name, &p.default) {
                violations.push(e);
            }
            if !param_names.insert(p.name.as_str()) {
                violations.push(GraphError::DuplicateParameter(p.name.clone()));
            }
        }

        let mut earlier: HashSet<&str> = HashSet::new();
        for step in &self.steps {
            if let Err(e) = check_name("step", &step.name) {
                violations.push(e);
            }

            if let Err(e) = step.arguments.check_tags() {
                violations.push(e);
            }

            let location = format!("step '{}'", step.name);
            for reference in step.references() {
                if let Err(e) = check_in_scope(&location, reference, &param_names, &earlier) {
                    violations.push(e);
                }
            }

            // Inserted after the reference scan so a step cannot read itself.
            if !earlier.insert(step.name.as_str()) {
                violations.push(GraphError::DuplicateStepName(step.name.clone()));
            }
        }

        if let Some(experiment) = &self.experiment {
            let no_steps = HashSet::new();
            for reference in experiment.references() {
                if let Err(e) =
                    check_in_scope("experiment config", reference, &param_names, &no_steps)
                {
                    violations.push(e);
                }
            }
        }

        trace!(violations = violations.len(), "validated step graph");
        violations
    }

    /// Attributes that some step reads from `step`, sorted.
    pub fn referenced_outputs(&self, step: &str) -> BTreeSet<String> {
        self.steps
            .iter()
            .flat_map(|s| s.references())
            .filter_map(|r| match r {
                Reference::StepOutput {
                    step: target,
                    attribute,
                } if target == step => Some(attribute.clone()),
                _ => None,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Transport format
    // -----------------------------------------------------------------------

    /// Render the graph as a JSON tree, references left as tagged objects.
    pub fn serialize(&self) -> Value {
        let parameters: Vec<Value> = self
            .parameters
            .iter()
            .map(|p| {
                json!({
                    "Name": p.name,
                    "Type": p.parameter_type().as_str(),
                    "DefaultValue": p.default,
                })
            })
            .collect();

        let steps: Vec<Value> = self
            .steps
            .iter()
            .map(|s| {
                json!({
                    "Name": s.name,
                    "Type": s.step_type.as_str(),
                    "Arguments": s.arguments.to_json(),
                })
            })
            .collect();

        let mut root = Map::new();
        root.insert("Version".into(), Value::String(self.version.clone()));
        root.insert("Metadata".into(), Value::Object(Map::new()));
        root.insert("Parameters".into(), Value::Array(parameters));
        if let Some(experiment) = &self.experiment {
            root.insert(
                "PipelineExperimentConfig".into(),
                json!({
                    "ExperimentName": experiment.experiment_name.to_json(),
                    "TrialName": experiment.trial_name.to_json(),
                }),
            );
        }
        root.insert("Steps".into(), Value::Array(steps));
        Value::Object(root)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let value = self.serialize();
        let out = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(out)
    }

    /// Structural parse of the transport format. No validation is run.
    pub fn parse(value: Value) -> Result<StepGraph> {
        let wire: WireDefinition = serde_json::from_value(value)?;
        wire.into_graph()
    }

    pub fn from_json_str(s: &str) -> Result<StepGraph> {
        let value: Value = serde_json::from_str(s)?;
        Self::parse(value)
    }

    /// BLAKE3 digest (hex) of the canonical serialized form.
    pub fn fingerprint(&self) -> String {
        // serde_json maps are key-sorted, so `to_string` is canonical.
        blake3::hash(self.serialize().to_string().as_bytes())
            .to_hex()
            .to_string()
    }
}

/// Non-finite floats have no JSON form.
fn check_default(name: &str, default: &ParameterValue) -> std::result::Result<(), GraphError> {
    match default {
        ParameterValue::Float(x) if !x.is_finite() => Err(GraphError::NonFiniteDefault {
            name: name.to_string(),
        }),
        _ => Ok(()),
    }
}

/// What `add_step` can see: the declared parameters and earlier steps.
struct Scope<'a> {
    params: HashSet<&'a str>,
    steps: HashSet<&'a str>,
}

impl<'a> Scope<'a> {
    fn new(parameters: &'a [Parameter], steps: &'a [Step]) -> Self {
        Self {
            params: parameters.iter().map(|p| p.name.as_str()).collect(),
            steps: steps.iter().map(|s| s.name.as_str()).collect(),
        }
    }

    fn check(&self, location: &str, reference: &Reference) -> std::result::Result<(), GraphError> {
        check_in_scope(location, reference, &self.params, &self.steps)
    }
}

fn check_in_scope(
    location: &str,
    reference: &Reference,
    params: &HashSet<&str>,
    earlier_steps: &HashSet<&str>,
) -> std::result::Result<(), GraphError> {
    let known = match reference {
        Reference::Parameter(name) => params.contains(name.as_str()),
        Reference::StepOutput { step, .. } => earlier_steps.contains(step.as_str()),
        Reference::Execution(_) => true,
    };
    if known {
        Ok(())
    } else {
        Err(GraphError::UnknownReference {
            location: location.to_string(),
            reference: reference.path(),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types (parse side)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireDefinition {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    parameters: Vec<WireParameter>,
    #[serde(default)]
    pipeline_experiment_config: Option<WireExperiment>,
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireParameter {
    name: String,
    #[serde(rename = "Type")]
    parameter_type: ParameterType,
    default_value: ParameterValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireExperiment {
    experiment_name: Value,
    trial_name: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireStep {
    name: String,
    #[serde(rename = "Type")]
    step_type: StepType,
    #[serde(default)]
    arguments: Value,
}

fn default_version() -> String {
    DEFINITION_VERSION.to_string()
}

impl WireDefinition {
    fn into_graph(self) -> Result<StepGraph> {
        let parameters = self
            .parameters
            .into_iter()
            .map(|p| {
                let found = p.default_value.parameter_type();
                match p.default_value.coerce(p.parameter_type) {
                    Some(default) => Ok(Parameter {
                        name: p.name,
                        default,
                    }),
                    None => Err(GraphError::MismatchedParameterType {
                        name: p.name,
                        declared: p.parameter_type,
                        found,
                    }),
                }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let steps = self
            .steps
            .into_iter()
            .map(|s| {
                let arguments = match s.arguments {
                    Value::Null => Argument::empty(),
                    other => Argument::try_from(other)?,
                };
                Ok(Step::new(s.name, s.step_type, arguments))
            })
            .collect::<std::result::Result<Vec<_>, GraphError>>()?;

        let experiment = self
            .pipeline_experiment_config
            .map(|e| -> std::result::Result<ExperimentConfig, GraphError> {
                Ok(ExperimentConfig {
                    experiment_name: expr_field("ExperimentName", &e.experiment_name)?,
                    trial_name: expr_field("TrialName", &e.trial_name)?,
                })
            })
            .transpose()?;

        Ok(StepGraph::from_parts(
            self.version,
            parameters,
            steps,
            experiment,
        ))
    }
}

/// Parse an experiment field that must be string-shaped.
pub(crate) fn expr_field(field: &str, value: &Value) -> std::result::Result<Expr, GraphError> {
    Expr::from_json(value)?.ok_or_else(|| {
        GraphError::MalformedReference(format!(
            "{field} must be a string or a reference, got {value}"
        ))
    })
}
