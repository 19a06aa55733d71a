mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use stepgraph::graph::{
    Argument, Expr, GraphError, ParameterValue, ResolutionContext, StepGraph, StepType,
    resolve_reference,
};

use crate::common::builders::ml_pipeline;
use crate::common::init_tracing;

#[test]
fn test_scenario_validates_and_serializes_in_order() {
    init_tracing();
    let g = ml_pipeline();

    assert!(g.validate().is_empty());

    let wire = g.serialize();
    let steps = wire["Steps"].as_array().unwrap();
    let names: Vec<&str> = steps.iter().map(|s| s["Name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Preprocess", "Train", "CreateModel"]);

    let train_s3 = &steps[1]["Arguments"]["InputDataConfig"][0]["S3Uri"];
    let path = train_s3["Get"].as_str().unwrap();
    assert!(path.starts_with("Steps.Preprocess."), "got {path}");

    assert_eq!(
        wire["Parameters"],
        json!([
            {"Name": "InputDataUri", "Type": "String", "DefaultValue": "s3://bucket/raw/data.csv"},
            {"Name": "InstanceType", "Type": "String", "DefaultValue": "ml.m5.large"},
        ])
    );
}

#[test]
fn test_forward_reference_is_rejected_and_graph_unchanged() {
    let mut g = StepGraph::new();
    g.add_step("A", StepType::Processing, Argument::empty())
        .unwrap();

    let result = g.add_step(
        "B",
        StepType::Training,
        Argument::map([("In", Expr::step_output("C", "out"))]),
    );

    match result {
        Err(GraphError::UnknownReference {
            location,
            reference,
        }) => {
            assert_eq!(location, "step 'B'");
            assert_eq!(reference, "Steps.C.out");
        }
        Err(e) => panic!("Expected UnknownReference, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    assert_eq!(g.steps().len(), 1);
}

#[test]
fn test_self_reference_is_rejected() {
    let mut g = StepGraph::new();
    let result = g.add_step(
        "Loop",
        StepType::Processing,
        Argument::map([("In", Expr::step_output("Loop", "out"))]),
    );
    assert!(matches!(result, Err(GraphError::UnknownReference { .. })));
}

#[test]
fn test_undeclared_parameter_is_rejected() {
    let mut g = StepGraph::new();
    let result = g.add_step(
        "A",
        StepType::Processing,
        Argument::map([("Type", Expr::param("Missing"))]),
    );
    match result {
        Err(GraphError::UnknownReference { reference, .. }) => {
            assert_eq!(reference, "Parameters.Missing");
        }
        other => panic!("Expected UnknownReference, got: {:?}", other.map(|s| s.name.clone())),
    }
}

#[test]
fn test_duplicate_step_keeps_first() {
    let mut g = StepGraph::new();
    g.add_step(
        "Train",
        StepType::Training,
        Argument::map([("Marker", "first")]),
    )
    .unwrap();

    let result = g.add_step(
        "Train",
        StepType::Training,
        Argument::map([("Marker", "second")]),
    );

    assert_eq!(
        result.map(|s| s.name.clone()),
        Err(GraphError::DuplicateStepName("Train".into()))
    );
    assert_eq!(g.steps().len(), 1);
    assert_eq!(
        g.step("Train").unwrap().arguments.to_json(),
        json!({"Marker": "first"})
    );
}

#[test]
fn test_duplicate_parameter_is_rejected() {
    let mut g = StepGraph::new();
    g.add_parameter("InstanceType", "ml.m5.large").unwrap();
    let result = g.add_parameter("InstanceType", "ml.c5.xlarge");
    assert_eq!(
        result.map(|p| p.name.clone()),
        Err(GraphError::DuplicateParameter("InstanceType".into()))
    );
    assert_eq!(g.parameters().len(), 1);
}

#[test]
fn test_invalid_names_are_rejected() {
    let mut g = StepGraph::new();
    assert!(matches!(
        g.add_step("has space", StepType::Model, Argument::empty()),
        Err(GraphError::InvalidName { kind: "step", .. })
    ));
    assert!(matches!(
        g.add_parameter("-leading", "x"),
        Err(GraphError::InvalidName { kind: "parameter", .. })
    ));
    assert!(g.steps().is_empty());
}

#[test]
fn test_concat_resolution() {
    let mut g = StepGraph::new();
    g.add_parameter("p", "X").unwrap();

    let expr = Expr::concat([Expr::literal("pre-"), Expr::param("p"), Expr::literal("-post")]);
    let ctx = ResolutionContext::from_graph(&g);
    assert_eq!(resolve_reference(&expr, &ctx).unwrap(), "pre-X-post");
}

#[test]
fn test_nested_concat_resolves_depth_first() {
    let mut g = StepGraph::new();
    g.add_parameter("Bucket", "b").unwrap();
    g.add_parameter("Env", "dev").unwrap();

    let expr = Expr::concat([
        Expr::literal("s3://"),
        Expr::param("Bucket"),
        Expr::concat([Expr::literal("/"), Expr::param("Env"), Expr::literal("/")]),
        Expr::literal("models"),
    ]);
    let ctx = ResolutionContext::from_graph(&g);
    assert_eq!(resolve_reference(&expr, &ctx).unwrap(), "s3://b/dev/models");
}

#[test]
fn test_bound_parameter_overrides_default() {
    let mut g = StepGraph::new();
    g.add_parameter("InstanceType", "ml.m5.large").unwrap();

    let mut ctx = ResolutionContext::from_graph(&g);
    ctx.bind_parameter("InstanceType", "ml.c5.xlarge");
    assert_eq!(
        resolve_reference(&Expr::param("InstanceType"), &ctx).unwrap(),
        "ml.c5.xlarge"
    );
}

#[test]
fn test_non_finite_float_default_is_rejected() {
    let mut g = StepGraph::new();
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(
            g.add_parameter("Rate", value).map(|p| p.name.clone()),
            Err(GraphError::NonFiniteDefault {
                name: "Rate".into()
            })
        );
    }
    assert!(g.parameters().is_empty());

    g.add_parameter("Rate", 0.25).unwrap();
    assert_eq!(
        StepGraph::parse(g.serialize()).unwrap().parameters()[0].default,
        ParameterValue::Float(0.25)
    );
}
