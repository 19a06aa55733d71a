// src/resource.rs

//! Custom-resource event envelope shared by the lifecycle and seed handlers.
//!
//! ```json
//! {
//!   "RequestType": "Create",
//!   "PhysicalResourceId": "optional-on-create",
//!   "ResourceProperties": { ... }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the provisioning tool is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
    /// Anything else is answered as a no-op.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(
    rename_all = "PascalCase",
    bound(deserialize = "P: Deserialize<'de> + Default")
)]
pub struct ResourceEvent<P> {
    pub request_type: RequestType,

    #[serde(default)]
    pub physical_resource_id: Option<String>,

    #[serde(default)]
    pub resource_properties: P,
}

impl<P> ResourceEvent<P> {
    pub fn new(request_type: RequestType, resource_properties: P) -> Self {
        Self {
            request_type,
            physical_resource_id: None,
            resource_properties,
        }
    }

    pub fn with_physical_id(mut self, id: impl Into<String>) -> Self {
        self.physical_resource_id = Some(id.into());
        self
    }
}

/// Handler reply: a stable physical id plus attributes for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceResponse {
    pub physical_resource_id: String,
    pub data: BTreeMap<String, Value>,
}

impl ResourceResponse {
    pub fn new(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Props {
        #[serde(default)]
        bucket: Option<String>,
    }

    #[test]
    fn unknown_request_type_maps_to_other() {
        let ev: ResourceEvent<Props> =
            serde_json::from_str(r#"{"RequestType": "Poke", "ResourceProperties": {}}"#).unwrap();
        assert_eq!(ev.request_type, RequestType::Other);
    }

    #[test]
    fn properties_default_when_absent() {
        let ev: ResourceEvent<Props> = serde_json::from_str(r#"{"RequestType": "Delete"}"#).unwrap();
        assert!(ev.resource_properties.bucket.is_none());
        assert!(ev.physical_resource_id.is_none());
    }

    #[test]
    fn response_serializes_pascal_case() {
        let r = ResourceResponse::new("id-1").with_data("Rows", 3);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["PhysicalResourceId"], "id-1");
        assert_eq!(v["Data"]["Rows"], 3);
    }
}
