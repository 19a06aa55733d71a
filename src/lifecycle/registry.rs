// src/lifecycle/registry.rs

//! Pluggable pipeline registry abstraction.
//!
//! The lifecycle handler talks to a `PipelineRegistry` instead of the
//! managed service directly, so tests (and the CLI) can use the in-memory
//! implementation.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("pipeline not found: {0}")]
    NotFound(String),

    #[error("pipeline already exists: {0}")]
    AlreadyExists(String),

    #[error("registry rejected request: {0}")]
    Rejected(String),
}

/// What is submitted on create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSubmission {
    pub name: String,
    pub role_arn: String,
    /// Serialized definition body, stored verbatim.
    pub definition: String,
    /// Fingerprint of the parsed definition.
    pub fingerprint: String,
}

/// What the registry knows about a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredPipeline {
    pub name: String,
    pub role_arn: String,
    pub definition: String,
    pub fingerprint: String,
    /// Starts at 1 on create and increases with every update.
    pub revision: u32,
}

pub trait PipelineRegistry {
    fn describe(&self, name: &str) -> Result<RegisteredPipeline, RegistryError>;

    fn exists(&self, name: &str) -> Result<bool, RegistryError> {
        match self.describe(name) {
            Ok(_) => Ok(true),
            Err(RegistryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn create(&mut self, submission: PipelineSubmission) -> Result<(), RegistryError>;

    fn update(&mut self, submission: PipelineSubmission) -> Result<(), RegistryError>;

    fn delete(&mut self, name: &str) -> Result<(), RegistryError>;
}

/// Registry kept in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    pipelines: BTreeMap<String, RegisteredPipeline>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

impl PipelineRegistry for InMemoryRegistry {
    fn describe(&self, name: &str) -> Result<RegisteredPipeline, RegistryError> {
        self.pipelines
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn create(&mut self, submission: PipelineSubmission) -> Result<(), RegistryError> {
        if self.pipelines.contains_key(&submission.name) {
            return Err(RegistryError::AlreadyExists(submission.name));
        }
        self.pipelines.insert(
            submission.name.clone(),
            RegisteredPipeline {
                name: submission.name,
                role_arn: submission.role_arn,
                definition: submission.definition,
                fingerprint: submission.fingerprint,
                revision: 1,
            },
        );
        Ok(())
    }

    fn update(&mut self, submission: PipelineSubmission) -> Result<(), RegistryError> {
        let existing = self
            .pipelines
            .get_mut(&submission.name)
            .ok_or_else(|| RegistryError::NotFound(submission.name.clone()))?;
        existing.role_arn = submission.role_arn;
        existing.definition = submission.definition;
        existing.fingerprint = submission.fingerprint;
        existing.revision += 1;
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), RegistryError> {
        self.pipelines
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}
