// src/alert.rs

//! Failure notification for pipeline executions.
//!
//! The execution engine emits a status-change event per execution. When the
//! status is `Failed` and the pipeline is ours, the event's own `detail` is
//! published to a fixed-name alert channel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

pub const PIPELINE_EVENT_SOURCE: &str = "aws.sagemaker";
pub const STATUS_CHANGE_DETAIL_TYPE: &str =
    "SageMaker Model Building Pipeline Execution Status Change";
pub const DEFAULT_ALERT_TOPIC: &str = "pipeline-failure-alerts";

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("failed to publish to '{topic}': {reason}")]
    Publish { topic: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Executing,
    Stopping,
    Stopped,
    Failed,
    Succeeded,
    #[serde(other)]
    Unknown,
}

/// `detail` of a status-change event. Fields beyond the two we match on
/// are kept so the published message carries the full detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetail {
    pub current_pipeline_execution_status: ExecutionStatus,
    pub pipeline_name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatusEvent {
    pub source: String,
    #[serde(rename = "detail-type")]
    pub detail_type: String,
    pub detail: StatusDetail,
}

impl PipelineStatusEvent {
    /// An engine-shaped event for `pipeline_name` with `status`.
    pub fn new(pipeline_name: impl Into<String>, status: ExecutionStatus) -> Self {
        Self {
            source: PIPELINE_EVENT_SOURCE.to_string(),
            detail_type: STATUS_CHANGE_DETAIL_TYPE.to_string(),
            detail: StatusDetail {
                current_pipeline_execution_status: status,
                pipeline_name: pipeline_name.into(),
                extra: BTreeMap::new(),
            },
        }
    }
}

/// A published alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub topic: String,
    pub body: String,
}

pub trait AlertSink {
    fn publish(&mut self, topic: &str, body: &str) -> Result<(), AlertError>;
}

/// Sink that keeps every message, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryAlertSink {
    pub messages: Vec<AlertMessage>,
}

impl MemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertSink for MemoryAlertSink {
    fn publish(&mut self, topic: &str, body: &str) -> Result<(), AlertError> {
        self.messages.push(AlertMessage {
            topic: topic.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Rule: failed executions of one pipeline go to one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureAlertRule {
    pub pipeline_name: String,
    pub topic: String,
}

impl FailureAlertRule {
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            topic: DEFAULT_ALERT_TOPIC.to_string(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Event-bus pattern equivalent to [`FailureAlertRule::matches`].
    pub fn event_pattern(&self) -> Value {
        json!({
            "source": [PIPELINE_EVENT_SOURCE],
            "detail-type": [STATUS_CHANGE_DETAIL_TYPE],
            "detail": {
                "currentPipelineExecutionStatus": ["Failed"],
                "pipelineName": [self.pipeline_name],
            }
        })
    }

    pub fn matches(&self, event: &PipelineStatusEvent) -> bool {
        event.source == PIPELINE_EVENT_SOURCE
            && event.detail_type == STATUS_CHANGE_DETAIL_TYPE
            && event.detail.current_pipeline_execution_status == ExecutionStatus::Failed
            && event.detail.pipeline_name == self.pipeline_name
    }

    /// Publish the event's detail when the rule matches. Returns whether it
    /// did.
    pub fn evaluate(
        &self,
        event: &PipelineStatusEvent,
        sink: &mut dyn AlertSink,
    ) -> Result<bool, AlertError> {
        if !self.matches(event) {
            debug!(
                pipeline = %event.detail.pipeline_name,
                status = ?event.detail.current_pipeline_execution_status,
                "status event ignored"
            );
            return Ok(false);
        }

        let body = serde_json::to_string(&event.detail)?;
        sink.publish(&self.topic, &body)?;
        info!(pipeline = %self.pipeline_name, topic = %self.topic, "published failure alert");
        Ok(true)
    }
}
