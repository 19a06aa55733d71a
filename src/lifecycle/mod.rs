// src/lifecycle/mod.rs

//! Pipeline lifecycle handler.
//!
//! Receives create/update/delete resource events for a named pipeline and
//! applies them to a [`PipelineRegistry`]:
//!
//! - `Create` / `Update`: the definition body must parse as a step graph and
//!   validate cleanly. The pipeline is created when the registry does not
//!   know it, otherwise updated. An update that changes neither the
//!   definition fingerprint nor the role is skipped.
//! - `Delete`: removes the pipeline; a pipeline that is already gone is fine.
//! - anything else: no-op.

pub mod registry;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::config::validate_graph;
use crate::errors::StepgraphError;
use crate::graph::StepGraph;
use crate::resource::{RequestType, ResourceEvent, ResourceResponse};

pub use registry::{
    InMemoryRegistry, PipelineRegistry, PipelineSubmission, RegisteredPipeline, RegistryError,
};

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("missing resource property: {0}")]
    MissingProperty(&'static str),

    #[error("PipelineDefinitionBody must be a non-empty JSON string")]
    MissingDefinition,

    #[error("invalid pipeline definition: {0}")]
    InvalidDefinition(#[source] StepgraphError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// `ResourceProperties` of a lifecycle event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineProperties {
    #[serde(default)]
    pub pipeline_name: Option<String>,
    #[serde(default)]
    pub role_arn: Option<String>,
    #[serde(default)]
    pub pipeline_definition_body: Option<String>,
}

/// What a create/update request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    Updated,
    Unchanged,
}

impl Applied {
    fn as_str(&self) -> &'static str {
        match self {
            Applied::Created => "Created",
            Applied::Updated => "Updated",
            Applied::Unchanged => "Unchanged",
        }
    }
}

pub fn physical_id(pipeline_name: &str) -> String {
    format!("sagemaker-pipeline-{pipeline_name}")
}

pub struct PipelineManager<R: PipelineRegistry> {
    registry: R,
}

impl<R: PipelineRegistry> PipelineManager<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn into_registry(self) -> R {
        self.registry
    }

    /// Handle one event. Errors are logged before being returned.
    pub fn handle(
        &mut self,
        event: &ResourceEvent<PipelineProperties>,
    ) -> Result<ResourceResponse, LifecycleError> {
        self.handle_inner(event).inspect_err(|e| {
            error!(error = %e, request = ?event.request_type, "pipeline lifecycle request failed");
        })
    }

    fn handle_inner(
        &mut self,
        event: &ResourceEvent<PipelineProperties>,
    ) -> Result<ResourceResponse, LifecycleError> {
        let props = &event.resource_properties;
        let name = props
            .pipeline_name
            .as_deref()
            .ok_or(LifecycleError::MissingProperty("PipelineName"))?;
        let role_arn = props
            .role_arn
            .as_deref()
            .ok_or(LifecycleError::MissingProperty("RoleArn"))?;

        let response = ResourceResponse::new(physical_id(name)).with_data("PipelineName", name);

        match event.request_type {
            RequestType::Create | RequestType::Update => {
                let body = props
                    .pipeline_definition_body
                    .as_deref()
                    .filter(|b| !b.trim().is_empty())
                    .ok_or(LifecycleError::MissingDefinition)?;
                let applied = self.create_or_update(name, role_arn, body)?;
                Ok(response.with_data("Result", applied.as_str()))
            }
            RequestType::Delete => {
                self.delete(name)?;
                Ok(response)
            }
            RequestType::Other => Ok(response),
        }
    }

    /// Parse and validate `body`, then create or update the pipeline.
    pub fn create_or_update(
        &mut self,
        name: &str,
        role_arn: &str,
        body: &str,
    ) -> Result<Applied, LifecycleError> {
        let graph = StepGraph::from_json_str(body).map_err(LifecycleError::InvalidDefinition)?;
        validate_graph(&graph).map_err(LifecycleError::InvalidDefinition)?;

        let submission = PipelineSubmission {
            name: name.to_string(),
            role_arn: role_arn.to_string(),
            definition: body.to_string(),
            fingerprint: graph.fingerprint(),
        };

        match self.registry.describe(name) {
            Ok(existing) => {
                if existing.fingerprint == submission.fingerprint
                    && existing.role_arn == submission.role_arn
                {
                    info!(pipeline = %name, revision = existing.revision, "pipeline unchanged, skipping update");
                    return Ok(Applied::Unchanged);
                }
                info!(pipeline = %name, "updating pipeline");
                self.registry.update(submission)?;
                Ok(Applied::Updated)
            }
            Err(RegistryError::NotFound(_)) => {
                info!(pipeline = %name, "creating pipeline");
                self.registry.create(submission)?;
                Ok(Applied::Created)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the pipeline; missing pipelines are ignored.
    pub fn delete(&mut self, name: &str) -> Result<(), LifecycleError> {
        match self.registry.delete(name) {
            Ok(()) => {
                info!(pipeline = %name, "deleted pipeline");
                Ok(())
            }
            Err(RegistryError::NotFound(_)) => {
                info!(pipeline = %name, "pipeline already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
