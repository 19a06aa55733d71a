// src/graph/resolve.rs

//! Reference resolution against a set of bindings.
//!
//! The execution engine does this for real; here it backs dry runs and
//! lets callers check what a reference would evaluate to.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::argument::Argument;
use super::definition::StepGraph;
use super::error::GraphError;
use super::reference::{ExecutionVariable, Expr, Reference};

/// Parameter bindings, execution variables and recorded step outputs.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    parameters: BTreeMap<String, String>,
    execution: BTreeMap<ExecutionVariable, String>,
    outputs: BTreeMap<String, BTreeMap<String, String>>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the graph's parameter defaults.
    pub fn from_graph(graph: &StepGraph) -> Self {
        let mut ctx = Self::new();
        for p in graph.parameters() {
            ctx.parameters.insert(p.name.clone(), p.default.to_string());
        }
        ctx
    }

    /// Bind (or override) a parameter value.
    pub fn bind_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn set_execution(&mut self, var: ExecutionVariable, value: impl Into<String>) {
        self.execution.insert(var, value.into());
    }

    /// Record one output attribute of an executed step.
    pub fn record_output(
        &mut self,
        step: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.outputs
            .entry(step.into())
            .or_default()
            .insert(attribute.into(), value.into());
    }

    pub fn record_outputs(&mut self, step: &str, outputs: BTreeMap<String, String>) {
        self.outputs
            .entry(step.to_string())
            .or_default()
            .extend(outputs);
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn output(&self, step: &str, attribute: &str) -> Option<&str> {
        self.outputs
            .get(step)
            .and_then(|attrs| attrs.get(attribute))
            .map(String::as_str)
    }

    pub fn has_executed(&self, step: &str) -> bool {
        self.outputs.contains_key(step)
    }

    fn lookup(&self, reference: &Reference) -> Result<&str, GraphError> {
        match reference {
            Reference::Parameter(name) => {
                self.parameter(name)
                    .ok_or_else(|| GraphError::UnknownReference {
                        location: "resolution context".to_string(),
                        reference: reference.path(),
                    })
            }
            Reference::StepOutput { step, attribute } => {
                self.output(step, attribute)
                    .ok_or_else(|| GraphError::MissingOutput {
                        step: step.clone(),
                        attribute: attribute.clone(),
                    })
            }
            Reference::Execution(var) => self
                .execution
                .get(var)
                .map(String::as_str)
                .ok_or_else(|| GraphError::UnknownReference {
                    location: "resolution context".to_string(),
                    reference: reference.path(),
                }),
        }
    }
}

/// Resolve an expression to its literal value.
///
/// `Concat` children are resolved depth-first, left-to-right, and joined.
pub fn resolve_reference(expr: &Expr, ctx: &ResolutionContext) -> Result<String, GraphError> {
    match expr {
        Expr::Literal(s) => Ok(s.clone()),
        Expr::Get(reference) => ctx.lookup(reference).map(str::to_string),
        Expr::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&resolve_reference(part, ctx)?);
            }
            Ok(out)
        }
    }
}

/// Resolve every reference in an argument tree, producing plain JSON.
pub fn resolve_argument(arg: &Argument, ctx: &ResolutionContext) -> Result<Value, GraphError> {
    match arg {
        Argument::Null => Ok(Value::Null),
        Argument::Bool(b) => Ok(Value::Bool(*b)),
        Argument::Number(n) => Ok(Value::Number(n.clone())),
        Argument::Expr(e) => resolve_reference(e, ctx).map(Value::String),
        Argument::List(items) => items
            .iter()
            .map(|item| resolve_argument(item, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Argument::Map(map) => map
            .iter()
            .map(|(k, v)| resolve_argument(v, ctx).map(|rv| (k.clone(), rv)))
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn concat_resolves_in_order() {
        let mut ctx = ResolutionContext::new();
        ctx.bind_parameter("p", "X");
        let e = Expr::concat([Expr::literal("pre-"), Expr::param("p"), Expr::literal("-post")]);
        assert_eq!(resolve_reference(&e, &ctx).unwrap(), "pre-X-post");
    }

    #[test]
    fn literal_only_concat() {
        let ctx = ResolutionContext::new();
        let e = Expr::concat([Expr::literal("a"), Expr::literal("b"), Expr::literal("c")]);
        assert_eq!(resolve_reference(&e, &ctx).unwrap(), "abc");
    }

    #[test]
    fn nested_concat() {
        let mut ctx = ResolutionContext::new();
        ctx.bind_parameter("bucket", "b");
        ctx.record_output("Train", "ModelArtifacts", "s3://b/model.tar.gz");
        let e = Expr::concat([
            Expr::literal("["),
            Expr::concat([Expr::param("bucket"), Expr::literal(":")]),
            Expr::step_output("Train", "ModelArtifacts"),
            Expr::literal("]"),
        ]);
        assert_eq!(
            resolve_reference(&e, &ctx).unwrap(),
            "[b:s3://b/model.tar.gz]"
        );
    }

    #[test]
    fn missing_step_output() {
        let mut ctx = ResolutionContext::new();
        ctx.record_output("Train", "ModelArtifacts", "x");
        let err = resolve_reference(&Expr::step_output("Train", "Other"), &ctx).unwrap_err();
        assert_eq!(
            err,
            GraphError::MissingOutput {
                step: "Train".into(),
                attribute: "Other".into()
            }
        );
        assert!(matches!(
            resolve_reference(&Expr::step_output("Never", "x"), &ctx),
            Err(GraphError::MissingOutput { .. })
        ));
    }

    #[test]
    fn unbound_parameter_and_execution_variable() {
        let ctx = ResolutionContext::new();
        assert!(matches!(
            resolve_reference(&Expr::param("p"), &ctx),
            Err(GraphError::UnknownReference { .. })
        ));
        assert!(matches!(
            resolve_reference(&Expr::execution(ExecutionVariable::PipelineName), &ctx),
            Err(GraphError::UnknownReference { .. })
        ));
    }

    #[test]
    fn defaults_come_from_graph_and_can_be_overridden() {
        let mut g = StepGraph::new();
        g.add_parameter("InstanceType", "ml.m5.large").unwrap();
        g.add_parameter("Count", 2_i64).unwrap();

        let mut ctx = ResolutionContext::from_graph(&g);
        assert_eq!(ctx.parameter("Count"), Some("2"));
        ctx.bind_parameter("InstanceType", "ml.c5.xlarge");
        assert_eq!(
            resolve_reference(&Expr::param("InstanceType"), &ctx).unwrap(),
            "ml.c5.xlarge"
        );
    }

    #[test]
    fn resolve_argument_tree() {
        let mut ctx = ResolutionContext::new();
        ctx.bind_parameter("uri", "s3://b/raw");
        let arg = Argument::map([
            ("Count", Argument::from(1_i64)),
            ("Inputs", Argument::list([Argument::from(Expr::param("uri"))])),
        ]);
        assert_eq!(
            resolve_argument(&arg, &ctx).unwrap(),
            json!({"Count": 1, "Inputs": ["s3://b/raw"]})
        );
    }
}
