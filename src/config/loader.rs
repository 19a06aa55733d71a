// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{AlertSection, PipelineFile, PipelineSection, RawPipelineFile};
use crate::config::validate::{ensure_has_steps, validate_graph, validate_pipeline_section};
use crate::errors::{Result, StepgraphError};
use crate::graph::StepGraph;

/// Load a declaration file from a given path and return the raw
/// `RawPipelineFile`.
///
/// This only performs TOML deserialization; it does **not** check
/// references or uniqueness. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawPipelineFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a pipeline from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - `.json` files are read as serialized definitions (see
///   [`load_definition`]).
/// - Anything else is read as a TOML declaration, converted into a step
///   graph and validated. All graph violations are reported at once via
///   [`StepgraphError::InvalidGraph`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let path = path.as_ref();
    let pipeline = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_definition(path)?,
        _ => {
            let raw_config = load_from_path(path)?;
            PipelineFile::try_from(raw_config)?
        }
    };

    info!(
        pipeline = %pipeline.name(),
        steps = pipeline.graph().steps().len(),
        fingerprint = %pipeline.graph().fingerprint(),
        "loaded pipeline"
    );
    Ok(pipeline)
}

/// Load an already-serialized definition (the engine's JSON format).
///
/// The pipeline name is the file name up to its first `.`, so
/// `demo-ml-pipeline.definition.json` is named `demo-ml-pipeline`.
pub fn load_definition(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let graph = StepGraph::from_json_str(&contents)?;

    let name = definition_name(path).ok_or_else(|| {
        StepgraphError::ConfigError(format!(
            "cannot derive a pipeline name from '{}'",
            path.display()
        ))
    })?;
    let section = PipelineSection {
        name,
        role_arn: None,
        version: graph.version().to_string(),
    };
    validate_pipeline_section(&section)?;
    ensure_has_steps(graph.steps().len())?;
    validate_graph(&graph)?;

    Ok(PipelineFile::new_unchecked(
        section,
        AlertSection::default(),
        graph,
    ))
}

fn definition_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.split('.').next()?;
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Helper to resolve a default declaration path.
///
/// Honours `STEPGRAPH_CONFIG` when set, otherwise `Pipeline.toml` in the
/// current working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("STEPGRAPH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Pipeline.toml"))
}
