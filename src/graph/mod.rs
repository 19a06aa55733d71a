// src/graph/mod.rs

//! Step-graph definition and reference resolution.
//!
//! - [`definition`] holds the graph and its builder/validation/transport
//!   operations.
//! - [`reference`] is the `Get` / `Concat` expression language.
//! - [`argument`] models the nested argument bundle of a step.
//! - [`resolve`] evaluates references against bindings.
//! - [`dry_run`] simulates execution in declaration order.
//! - [`deps`] is a `petgraph` view of step-to-step data dependencies.

pub mod argument;
pub mod definition;
pub mod deps;
pub mod dry_run;
pub mod error;
pub mod names;
pub mod parameter;
pub mod reference;
pub mod resolve;
pub mod step;

pub use argument::Argument;
pub use definition::{DEFINITION_VERSION, ExperimentConfig, StepGraph};
pub use deps::DependencyGraph;
pub use dry_run::{PlaceholderExecutor, ResolvedStep, StepExecutor, dry_run};
pub use error::GraphError;
pub use parameter::{Parameter, ParameterType, ParameterValue};
pub use reference::{ExecutionVariable, Expr, Reference};
pub use resolve::{ResolutionContext, resolve_argument, resolve_reference};
pub use step::{Step, StepType};
