// src/config/validate.rs

use tracing::debug;

use crate::config::model::{
    AlertSection, ExperimentSection, PipelineFile, PipelineSection, RawPipelineFile,
};
use crate::errors::{Result, StepgraphError};
use crate::graph::definition::expr_field;
use crate::graph::names::check_name;
use crate::graph::{Argument, ExperimentConfig, GraphError, Parameter, Step, StepGraph};

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = crate::errors::StepgraphError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        validate_pipeline_section(&raw.pipeline)?;
        ensure_has_steps(raw.steps.len())?;
        validate_alert_section(&raw.alerts)?;

        let graph = graph_from_declaration(&raw)?;
        validate_graph(&graph)?;

        Ok(PipelineFile::new_unchecked(raw.pipeline, raw.alerts, graph))
    }
}

/// Run [`StepGraph::validate`] and turn any violations into one error.
pub fn validate_graph(graph: &StepGraph) -> Result<()> {
    let violations = graph.validate();
    if violations.is_empty() {
        debug!(steps = graph.steps().len(), "step graph is valid");
        Ok(())
    } else {
        Err(StepgraphError::InvalidGraph(violations))
    }
}

pub(crate) fn validate_pipeline_section(section: &PipelineSection) -> Result<()> {
    check_name("pipeline", &section.name).map_err(|e| {
        StepgraphError::ConfigError(format!("[pipeline].name: {e}"))
    })?;

    if section.version.trim().is_empty() {
        return Err(StepgraphError::ConfigError(
            "[pipeline].version must not be empty".to_string(),
        ));
    }

    if let Some(role) = &section.role_arn {
        if role.trim().is_empty() {
            return Err(StepgraphError::ConfigError(
                "[pipeline].role_arn must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

pub(crate) fn ensure_has_steps(count: usize) -> Result<()> {
    if count == 0 {
        return Err(StepgraphError::ConfigError(
            "pipeline must contain at least one step".to_string(),
        ));
    }
    Ok(())
}

fn validate_alert_section(section: &AlertSection) -> Result<()> {
    if section.topic.trim().is_empty() {
        return Err(StepgraphError::ConfigError(
            "[alerts].topic must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Convert the declaration into an unchecked graph.
///
/// Only structural problems (a malformed `Get`/`Concat`) fail here;
/// scoping and uniqueness are left to `validate` so that all of them are
/// reported together.
fn graph_from_declaration(raw: &RawPipelineFile) -> Result<StepGraph> {
    let parameters = raw
        .parameters
        .iter()
        .map(|p| Parameter {
            name: p.name.clone(),
            default: p.default.clone(),
        })
        .collect();

    let steps = raw
        .steps
        .iter()
        .map(|s| {
            let arguments = match &s.arguments {
                Some(value) => Argument::try_from(value.clone())?,
                None => Argument::empty(),
            };
            Ok(Step::new(s.name.clone(), s.step_type, arguments))
        })
        .collect::<std::result::Result<Vec<_>, GraphError>>()?;

    let experiment = raw
        .experiment
        .as_ref()
        .map(experiment_from_section)
        .transpose()?;

    Ok(StepGraph::from_parts(
        raw.pipeline.version.clone(),
        parameters,
        steps,
        experiment,
    ))
}

fn experiment_from_section(
    section: &ExperimentSection,
) -> std::result::Result<ExperimentConfig, GraphError> {
    let defaults = ExperimentConfig::default();
    Ok(ExperimentConfig {
        experiment_name: match &section.experiment_name {
            Some(v) => expr_field("experiment_name", v)?,
            None => defaults.experiment_name,
        },
        trial_name: match &section.trial_name {
            Some(v) => expr_field("trial_name", v)?,
            None => defaults.trial_name,
        },
    })
}
