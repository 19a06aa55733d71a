#![allow(dead_code)]

use serde_json::{Map, Value, json};
use stepgraph::config::{
    AlertSection, ExperimentSection, ParameterDecl, PipelineFile, PipelineSection,
    RawPipelineFile, StepDecl,
};
use stepgraph::errors::Result;
use stepgraph::graph::{
    Argument, DEFINITION_VERSION, Expr, ParameterValue, StepGraph, StepType,
};

/// Builder for `PipelineFile` to simplify test setup.
pub struct PipelineFileBuilder {
    raw: RawPipelineFile,
}

impl PipelineFileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            raw: RawPipelineFile {
                pipeline: PipelineSection {
                    name: name.to_string(),
                    role_arn: None,
                    version: DEFINITION_VERSION.to_string(),
                },
                alerts: AlertSection::default(),
                experiment: None,
                parameters: vec![],
                steps: vec![],
            },
        }
    }

    pub fn with_role(mut self, role_arn: &str) -> Self {
        self.raw.pipeline.role_arn = Some(role_arn.to_string());
        self
    }

    pub fn with_alert_topic(mut self, topic: &str) -> Self {
        self.raw.alerts.topic = topic.to_string();
        self
    }

    pub fn with_parameter(mut self, name: &str, default: impl Into<ParameterValue>) -> Self {
        self.raw.parameters.push(ParameterDecl {
            name: name.to_string(),
            default: default.into(),
        });
        self
    }

    pub fn with_step(mut self, step: StepDecl) -> Self {
        self.raw.steps.push(step);
        self
    }

    pub fn with_default_experiment(mut self) -> Self {
        self.raw.experiment = Some(ExperimentSection::default());
        self
    }

    pub fn raw(self) -> RawPipelineFile {
        self.raw
    }

    pub fn try_build(self) -> Result<PipelineFile> {
        PipelineFile::try_from(self.raw)
    }

    pub fn build(self) -> PipelineFile {
        self.try_build()
            .expect("Failed to build valid pipeline from builder")
    }
}

/// Builder for `StepDecl`.
pub struct StepDeclBuilder {
    name: String,
    step_type: StepType,
    arguments: Map<String, Value>,
}

impl StepDeclBuilder {
    pub fn new(name: &str, step_type: StepType) -> Self {
        Self {
            name: name.to_string(),
            step_type,
            arguments: Map::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: Value) -> Self {
        self.arguments.insert(key.to_string(), value);
        self
    }

    /// Shorthand for an argument that is a single `Get`.
    pub fn get(self, key: &str, path: &str) -> Self {
        self.arg(key, json!({ "Get": path }))
    }

    pub fn build(self) -> StepDecl {
        StepDecl {
            name: self.name,
            step_type: self.step_type,
            arguments: if self.arguments.is_empty() {
                None
            } else {
                Some(Value::Object(self.arguments))
            },
        }
    }
}

pub const TRAIN_OUTPUT: &str = "ProcessingOutputConfig.Outputs['train'].S3Output.S3Uri";
pub const MODEL_ARTIFACTS: &str = "ModelArtifacts.S3ModelArtifacts";

/// The three-step training pipeline: Preprocess -> Train -> CreateModel.
pub fn ml_pipeline() -> StepGraph {
    let mut g = StepGraph::new();
    g.add_parameter("InputDataUri", "s3://bucket/raw/data.csv")
        .expect("InputDataUri");
    g.add_parameter("InstanceType", "ml.m5.large")
        .expect("InstanceType");

    g.add_step(
        "Preprocess",
        StepType::Processing,
        Argument::map([
            (
                "ProcessingResources",
                Argument::map([(
                    "ClusterConfig",
                    Argument::map([
                        ("InstanceType", Argument::from(Expr::param("InstanceType"))),
                        ("InstanceCount", Argument::from(1_i64)),
                    ]),
                )]),
            ),
            (
                "ProcessingInputs",
                Argument::list([Argument::map([(
                    "S3Uri",
                    Expr::param("InputDataUri"),
                )])]),
            ),
        ]),
    )
    .expect("Preprocess");

    g.add_step(
        "Train",
        StepType::Training,
        Argument::map([(
            "InputDataConfig",
            Argument::list([Argument::map([
                ("ChannelName", Argument::from("train")),
                (
                    "S3Uri",
                    Argument::from(Expr::step_output("Preprocess", TRAIN_OUTPUT)),
                ),
            ])]),
        )]),
    )
    .expect("Train");

    g.add_step(
        "CreateModel",
        StepType::Model,
        Argument::map([(
            "PrimaryContainer",
            Argument::map([(
                "ModelDataUrl",
                Expr::step_output("Train", MODEL_ARTIFACTS),
            )]),
        )]),
    )
    .expect("CreateModel");

    g
}
