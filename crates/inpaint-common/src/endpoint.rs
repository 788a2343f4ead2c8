use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A serving endpoint that models are deployed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    pub display_name: String,

    /// Deployed-model id -> percent of traffic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub traffic_split: BTreeMap<String, u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployed_models: Vec<DeployedModel>,
}

/// Association of a model with an endpoint and the resources serving it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployedModel {
    /// Assigned by the platform when the deployment is created.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Resource name of the deployed model.
    pub model: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedicated_resources: Option<DedicatedResources>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DedicatedResources {
    pub machine_spec: MachineSpec,
    pub min_replica_count: u32,
    pub max_replica_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    pub machine_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_count: Option<u32>,
}
