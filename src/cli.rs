// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `stepgraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stepgraph",
    version,
    about = "Declare, validate and render ML pipeline step graphs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline declaration (TOML) or serialized definition (JSON).
    ///
    /// Default: `STEPGRAPH_CONFIG`, else `Pipeline.toml` in the current
    /// working directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STEPGRAPH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check the pipeline and print every violation.
    Validate,

    /// Write the serialized definition.
    Render {
        /// Output file; stdout when omitted.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Single-line JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,
    },

    /// Resolve every step in order with placeholder outputs.
    DryRun {
        /// Override a parameter, e.g. `--param InstanceType=ml.c5.xlarge`.
        #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_binding)]
        params: Vec<(String, String)>,

        /// Value for `Execution.PipelineExecutionId`.
        #[arg(long, value_name = "ID", default_value = "dry-run")]
        execution_id: String,
    },

    /// Print each step's data dependencies.
    Deps,

    /// Write the synthetic seed dataset into a local object store.
    Seed {
        /// Store root; objects land at `<root>/<bucket>/<key>`.
        #[arg(long, value_name = "DIR")]
        root: PathBuf,

        #[arg(long, value_name = "NAME")]
        bucket: String,

        #[arg(long, value_name = "PREFIX", default_value = crate::seed::DEFAULT_RAW_PREFIX)]
        prefix: String,

        #[arg(long, value_name = "N", default_value_t = crate::seed::DEFAULT_ROWS)]
        rows: usize,
    },

    /// Print the failure-alert rule for the pipeline.
    AlertRule,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_binding(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
