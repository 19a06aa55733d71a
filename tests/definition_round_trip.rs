mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use stepgraph::errors::StepgraphError;
use stepgraph::graph::{
    Argument, ExecutionVariable, ExperimentConfig, Expr, GraphError, Reference, StepGraph,
    StepType,
};

use crate::common::builders::{TRAIN_OUTPUT, ml_pipeline};

#[test]
fn test_serialize_then_parse_preserves_graph() {
    let mut g = ml_pipeline();
    g.set_experiment(ExperimentConfig::default()).unwrap();

    let text = g.to_json_string(true).unwrap();
    let parsed = StepGraph::from_json_str(&text).unwrap();

    assert_eq!(parsed, g);
    assert!(parsed.validate().is_empty());
    assert_eq!(parsed.fingerprint(), g.fingerprint());

    let train = parsed.step("Train").unwrap();
    let s3 = train
        .arguments
        .get("InputDataConfig")
        .and_then(|list| match list {
            Argument::List(items) => items.first(),
            _ => None,
        })
        .and_then(|channel| channel.get("S3Uri"))
        .and_then(Argument::as_expr)
        .unwrap();
    assert!(s3.is_deferred());
    assert_eq!(
        s3,
        &Expr::Get(Reference::StepOutput {
            step: "Preprocess".into(),
            attribute: TRAIN_OUTPUT.into(),
        })
    );
}

#[test]
fn test_experiment_defaults_to_execution_variables() {
    let mut g = StepGraph::new();
    g.set_experiment(ExperimentConfig::default()).unwrap();

    assert_eq!(
        g.serialize()["PipelineExperimentConfig"],
        json!({
            "ExperimentName": {"Get": "Execution.PipelineName"},
            "TrialName": {"Get": "Execution.PipelineExecutionId"},
        })
    );
}

#[test]
fn test_experiment_may_not_reference_steps() {
    let mut g = ml_pipeline();
    let result = g.set_experiment(ExperimentConfig {
        experiment_name: Expr::step_output("Train", "TrainingJobName"),
        trial_name: Expr::execution(ExecutionVariable::PipelineExecutionId),
    });
    assert!(matches!(result, Err(GraphError::UnknownReference { .. })));
    assert!(g.experiment().is_none());
}

#[test]
fn test_parse_accepts_engine_definition() {
    let body = json!({
        "Version": "2020-12-01",
        "Metadata": {},
        "Parameters": [
            {"Name": "Epochs", "Type": "Integer", "DefaultValue": 10},
            {"Name": "LearningRate", "Type": "Float", "DefaultValue": 1}
        ],
        "Steps": [
            {"Name": "Train", "Type": "Training", "Arguments": {
                "HyperParameters": {"epochs": {"Get": "Parameters.Epochs"}},
                "OutputDataConfig": {"S3OutputPath": {"Concat": [
                    "s3://models/", {"Get": "Execution.PipelineExecutionId"}
                ]}}
            }}
        ]
    });

    let g = StepGraph::parse(body).unwrap();
    assert!(g.validate().is_empty());
    assert_eq!(g.steps()[0].step_type, StepType::Training);
    // An integer default for a Float parameter is widened.
    assert_eq!(
        g.serialize()["Parameters"][1],
        json!({"Name": "LearningRate", "Type": "Float", "DefaultValue": 1.0})
    );
}

#[test]
fn test_parse_rejects_malformed_concat() {
    let body = r#"{"Steps": [{"Name": "A", "Type": "Processing",
        "Arguments": {"Uri": {"Concat": ["s3://", 42]}}}]}"#;

    match StepGraph::from_json_str(body) {
        Err(StepgraphError::Graph(GraphError::MalformedConcat(_))) => {}
        Err(e) => panic!("Expected MalformedConcat, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_parse_rejects_mismatched_parameter_type() {
    let body = r#"{"Parameters": [{"Name": "N", "Type": "Integer", "DefaultValue": "ten"}]}"#;

    match StepGraph::from_json_str(body) {
        Err(StepgraphError::Graph(GraphError::MismatchedParameterType { name, .. })) => {
            assert_eq!(name, "N");
        }
        Err(e) => panic!("Expected MismatchedParameterType, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_parsed_graph_reports_every_violation() {
    let body = json!({
        "Parameters": [
            {"Name": "P", "Type": "String", "DefaultValue": "a"},
            {"Name": "P", "Type": "String", "DefaultValue": "b"}
        ],
        "Steps": [
            {"Name": "A", "Type": "Processing", "Arguments": {"x": {"Get": "Steps.B.out"}}},
            {"Name": "B", "Type": "Processing", "Arguments": {}},
            {"Name": "B", "Type": "Model", "Arguments": {"y": {"Get": "Parameters.Nope"}}}
        ]
    });

    let g = StepGraph::parse(body).unwrap();
    assert_eq!(
        g.validate(),
        vec![
            GraphError::DuplicateParameter("P".into()),
            GraphError::UnknownReference {
                location: "step 'A'".into(),
                reference: "Steps.B.out".into(),
            },
            GraphError::UnknownReference {
                location: "step 'B'".into(),
                reference: "Parameters.Nope".into(),
            },
            GraphError::DuplicateStepName("B".into()),
        ]
    );
}

#[test]
fn test_version_survives_round_trip() {
    let g = StepGraph::new().with_version("2021-06-01");
    let parsed = StepGraph::parse(g.serialize()).unwrap();
    assert_eq!(parsed.version(), "2021-06-01");
    assert_ne!(parsed.fingerprint(), StepGraph::new().fingerprint());
}

#[test]
fn test_fingerprint_tracks_content() {
    let a = ml_pipeline();
    let mut b = ml_pipeline();
    assert_eq!(a.fingerprint(), b.fingerprint());

    b.add_step("Extra", StepType::Endpoint, Argument::empty())
        .unwrap();
    assert_ne!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_tag_shaped_literal_maps_cannot_enter_the_graph() {
    let mut g = StepGraph::new();
    g.add_parameter("X", "x").unwrap();

    let concat = g.add_step(
        "A",
        StepType::Processing,
        Argument::map([("Concat", "literal")]),
    );
    assert!(matches!(concat, Err(GraphError::MalformedConcat(_))));

    let get = g.add_step(
        "A",
        StepType::Processing,
        Argument::map([("Nested", Argument::map([("Get", "Parameters.X")]))]),
    );
    assert!(matches!(get, Err(GraphError::MalformedReference(_))));
    assert!(g.steps().is_empty());

    // Whatever was accepted serializes back to an equal graph.
    g.add_step(
        "A",
        StepType::Processing,
        Argument::map([
            ("Uri", Argument::from(Expr::param("X"))),
            ("Get", Argument::from("not a tag, it has a sibling")),
        ]),
    )
    .unwrap();
    let parsed = StepGraph::parse(g.serialize()).unwrap();
    assert_eq!(parsed, g);
    assert!(parsed.validate().is_empty());
}
