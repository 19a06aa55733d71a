// src/config/mod.rs

//! Pipeline declaration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a declaration or serialized definition from disk (`loader.rs`).
//! - Turn a raw declaration into a validated step graph (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_definition, load_from_path};
pub use model::{
    AlertSection, ExperimentSection, ParameterDecl, PipelineFile, PipelineSection,
    RawPipelineFile, StepDecl,
};
pub use validate::validate_graph;
