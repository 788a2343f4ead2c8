use serde::{Deserialize, Serialize};

/// A registered model resource on the serving platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Platform-assigned resource name, e.g. `projects/p/locations/r/models/123`.
    /// Empty until the platform has created the resource.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Human-readable name. Not unique on the platform.
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_spec: Option<ContainerSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

/// Serving container the platform runs for a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    pub image_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predict_route: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_route: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub container_port: u16,
}
