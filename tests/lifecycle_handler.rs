mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use stepgraph::graph::{Argument, StepType};
use stepgraph::lifecycle::{
    Applied, InMemoryRegistry, LifecycleError, PipelineManager, PipelineProperties,
    PipelineRegistry, physical_id,
};
use stepgraph::resource::{RequestType, ResourceEvent};

use crate::common::builders::ml_pipeline;
use crate::common::init_tracing;

const ROLE: &str = "arn:aws:iam::123456789012:role/PipelineExecutionRole";

fn body() -> String {
    ml_pipeline().to_json_string(false).unwrap()
}

fn event(req: RequestType, body: Option<String>) -> ResourceEvent<PipelineProperties> {
    ResourceEvent::new(
        req,
        PipelineProperties {
            pipeline_name: Some("demo-ml-pipeline".into()),
            role_arn: Some(ROLE.into()),
            pipeline_definition_body: body,
        },
    )
}

#[test]
fn test_create_then_identical_update_is_skipped() {
    init_tracing();
    let mut mgr = PipelineManager::new(InMemoryRegistry::new());

    let created = mgr
        .handle(&event(RequestType::Create, Some(body())))
        .unwrap();
    assert_eq!(created.physical_resource_id, physical_id("demo-ml-pipeline"));
    assert_eq!(created.data["PipelineName"], json!("demo-ml-pipeline"));
    assert_eq!(created.data["Result"], json!("Created"));

    let again = mgr
        .handle(&event(RequestType::Update, Some(body())))
        .unwrap();
    assert_eq!(again.data["Result"], json!("Unchanged"));
    assert_eq!(mgr.registry().describe("demo-ml-pipeline").unwrap().revision, 1);
}

#[test]
fn test_changed_definition_is_updated() {
    let mut mgr = PipelineManager::new(InMemoryRegistry::new());
    assert_eq!(
        mgr.create_or_update("p", ROLE, &body()).unwrap(),
        Applied::Created
    );

    let mut g = ml_pipeline();
    g.add_step("Deploy", StepType::Endpoint, Argument::empty())
        .unwrap();
    let changed = g.to_json_string(false).unwrap();

    assert_eq!(
        mgr.create_or_update("p", ROLE, &changed).unwrap(),
        Applied::Updated
    );
    let stored = mgr.registry().describe("p").unwrap();
    assert_eq!(stored.revision, 2);
    assert_eq!(stored.fingerprint, g.fingerprint());

    // A role change alone also counts as an update.
    assert_eq!(
        mgr.create_or_update("p", "arn:aws:iam::1:role/Other", &changed)
            .unwrap(),
        Applied::Updated
    );
}

#[test]
fn test_delete_of_missing_pipeline_succeeds() {
    let mut mgr = PipelineManager::new(InMemoryRegistry::new());
    let resp = mgr.handle(&event(RequestType::Delete, None)).unwrap();
    assert_eq!(resp.physical_resource_id, "sagemaker-pipeline-demo-ml-pipeline");

    mgr.handle(&event(RequestType::Create, Some(body())))
        .unwrap();
    mgr.handle(&event(RequestType::Delete, None)).unwrap();
    assert!(mgr.registry().is_empty());
}

#[test]
fn test_invalid_body_is_rejected() {
    let mut mgr = PipelineManager::new(InMemoryRegistry::new());

    let forward_ref = json!({
        "Steps": [{"Name": "A", "Type": "Processing",
                   "Arguments": {"x": {"Get": "Steps.B.out"}}}]
    })
    .to_string();

    assert!(matches!(
        mgr.handle(&event(RequestType::Create, Some(forward_ref))),
        Err(LifecycleError::InvalidDefinition(_))
    ));
    assert!(matches!(
        mgr.handle(&event(RequestType::Create, Some("not json".into()))),
        Err(LifecycleError::InvalidDefinition(_))
    ));
    assert!(matches!(
        mgr.handle(&event(RequestType::Create, Some("  ".into()))),
        Err(LifecycleError::MissingDefinition)
    ));
    assert!(mgr.registry().is_empty());
}

#[test]
fn test_missing_properties_and_unknown_request() {
    let mut mgr = PipelineManager::new(InMemoryRegistry::new());

    let no_role = ResourceEvent::new(
        RequestType::Create,
        PipelineProperties {
            pipeline_name: Some("p".into()),
            ..Default::default()
        },
    );
    assert!(matches!(
        mgr.handle(&no_role),
        Err(LifecycleError::MissingProperty("RoleArn"))
    ));

    let raw = json!({
        "RequestType": "Poke",
        "ResourceProperties": {"PipelineName": "p", "RoleArn": ROLE}
    });
    let ev: ResourceEvent<PipelineProperties> = serde_json::from_value(raw).unwrap();
    assert_eq!(ev.request_type, RequestType::Other);
    let resp = mgr.handle(&ev).unwrap();
    assert_eq!(resp.physical_resource_id, physical_id("p"));
    assert!(mgr.registry().is_empty());
}
