// src/lib.rs

pub mod alert;
pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod lifecycle;
pub mod logging;
pub mod resource;
pub mod seed;

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{PipelineFile, default_config_path, load_and_validate};
use crate::errors::StepgraphError;
use crate::graph::{
    DependencyGraph, ExecutionVariable, ParameterType, PlaceholderExecutor, ResolutionContext,
    StepGraph, dry_run,
};
use crate::seed::{LocalDirStore, SeedHandler, SeedSettings};

/// High-level entry point used by `main.rs`.
///
/// Every subcommand except `seed` loads and validates the pipeline first.
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    debug!(config = %config_path.display(), command = ?args.command, "dispatching");

    match args.command {
        Command::Validate => run_validate(&config_path),
        Command::Render { out, compact } => {
            let pipeline = load_and_validate(&config_path)?;
            let body = pipeline.graph().to_json_string(!compact)?;
            match out {
                Some(path) => {
                    fs::write(&path, format!("{body}\n"))
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(out = %path.display(), "rendered definition");
                }
                None => println!("{body}"),
            }
            Ok(())
        }
        Command::DryRun {
            params,
            execution_id,
        } => {
            let pipeline = load_and_validate(&config_path)?;
            run_dry_run(&pipeline, &params, &execution_id)
        }
        Command::Deps => {
            let pipeline = load_and_validate(&config_path)?;
            print_deps(pipeline.graph())
        }
        Command::Seed {
            root,
            bucket,
            prefix,
            rows,
        } => {
            let settings = SeedSettings::new(bucket, prefix, rows);
            let mut handler = SeedHandler::new(LocalDirStore::new(&root));
            let uri = handler.seed(&settings)?;
            println!("{uri}");
            Ok(())
        }
        Command::AlertRule => {
            let pipeline = load_and_validate(&config_path)?;
            let rule = pipeline.alert_rule();
            println!("topic: {}", rule.topic);
            println!("{}", serde_json::to_string_pretty(&rule.event_pattern())?);
            Ok(())
        }
    }
}

/// Print every violation, not just the first.
fn run_validate(config_path: &Path) -> Result<()> {
    match load_and_validate(config_path) {
        Ok(pipeline) => {
            println!(
                "{}: ok ({} parameters, {} steps, fingerprint {})",
                pipeline.name(),
                pipeline.graph().parameters().len(),
                pipeline.graph().steps().len(),
                pipeline.graph().fingerprint()
            );
            Ok(())
        }
        Err(StepgraphError::InvalidGraph(violations)) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for v in &violations {
                writeln!(out, "error: {v}")?;
            }
            bail!(
                "{} is invalid: {} violation(s)",
                config_path.display(),
                violations.len()
            )
        }
        Err(e) => Err(e.into()),
    }
}

fn run_dry_run(
    pipeline: &PipelineFile,
    params: &[(String, String)],
    execution_id: &str,
) -> Result<()> {
    let graph = pipeline.graph();
    let mut ctx = dry_run_context(pipeline, execution_id);

    for (name, value) in params {
        let declared = graph
            .parameter(name)
            .ok_or_else(|| anyhow!("--param {name}: no such parameter"))?;
        check_override(name, declared.parameter_type(), value)?;
        ctx.bind_parameter(name.clone(), value.clone());
    }

    let mut executor = PlaceholderExecutor::for_graph(graph);
    let steps = dry_run(graph, &mut ctx, &mut executor)?;

    let rendered: Vec<serde_json::Value> = steps
        .into_iter()
        .map(|s| {
            serde_json::json!({
                "Name": s.name,
                "Type": s.step_type.as_str(),
                "Arguments": s.arguments,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

fn dry_run_context(pipeline: &PipelineFile, execution_id: &str) -> ResolutionContext {
    let mut ctx = ResolutionContext::from_graph(pipeline.graph());
    for var in ExecutionVariable::ALL {
        let value = match var {
            ExecutionVariable::PipelineName => pipeline.name().to_string(),
            ExecutionVariable::PipelineExecutionId => execution_id.to_string(),
            ExecutionVariable::PipelineExecutionArn => format!(
                "arn:dryrun:pipeline/{}/execution/{execution_id}",
                pipeline.name()
            ),
            ExecutionVariable::StartDateTime | ExecutionVariable::CurrentDateTime => {
                "1970-01-01T00:00:00Z".to_string()
            }
        };
        ctx.set_execution(var, value);
    }
    ctx
}

/// An override must be readable as the parameter's declared type.
fn check_override(name: &str, ty: ParameterType, value: &str) -> Result<()> {
    let ok = match ty {
        ParameterType::String => true,
        ParameterType::Integer => value.parse::<i64>().is_ok(),
        ParameterType::Float => value.parse::<f64>().is_ok(),
        ParameterType::Boolean => matches!(value, "true" | "false"),
    };
    if ok {
        Ok(())
    } else {
        bail!("--param {name}: '{value}' is not a valid {ty}")
    }
}

fn print_deps(graph: &StepGraph) -> Result<()> {
    let deps = DependencyGraph::from_graph(graph);
    for step in graph.steps() {
        let upstream = deps.dependencies_of(&step.name);
        if upstream.is_empty() {
            println!("{} ({})", step.name, step.step_type);
        } else {
            println!(
                "{} ({}) <- {}",
                step.name,
                step.step_type,
                upstream.join(", ")
            );
        }
    }
    println!("roots: {}", deps.roots().join(", "));
    Ok(())
}
