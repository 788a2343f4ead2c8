use std::collections::BTreeMap;

use crate::endpoint::{DedicatedResources, DeployedModel, MachineSpec};
use crate::model::{ContainerSpec, Model, Port};

/// Traffic-split key the platform resolves to "the model deployed by this request".
pub const NEW_DEPLOYMENT_SLOT: &str = "0";

/// Fixed serving shape of the inpainting model.
///
/// Replica bounds are pinned to 1..=1, so the deployment never scales to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentProfile {
    pub model_display_name: String,
    pub endpoint_display_name: String,
    pub machine_type: String,
    pub accelerator_type: String,
    pub accelerator_count: u32,
    pub min_replica_count: u32,
    pub max_replica_count: u32,
    pub predict_route: String,
    pub health_route: String,
    pub container_port: u16,
    pub traffic_percent: u32,
}

impl Default for DeploymentProfile {
    fn default() -> Self {
        Self {
            model_display_name: "inpainting-model".to_string(),
            endpoint_display_name: "inpainting-endpoint".to_string(),
            machine_type: "n1-standard-4".to_string(),
            accelerator_type: "NVIDIA_TESLA_T4".to_string(),
            accelerator_count: 1,
            min_replica_count: 1,
            max_replica_count: 1,
            predict_route: "/inpaint".to_string(),
            health_route: "/".to_string(),
            container_port: 8080,
            traffic_percent: 100,
        }
    }
}

impl DeploymentProfile {
    /// Model resource to upload for `image_uri`. The name is assigned by the platform.
    pub fn model_for_image(&self, image_uri: &str) -> Model {
        Model {
            name: String::new(),
            display_name: self.model_display_name.clone(),
            container_spec: Some(ContainerSpec {
                image_uri: image_uri.to_string(),
                predict_route: Some(self.predict_route.clone()),
                health_route: Some(self.health_route.clone()),
                ports: vec![Port {
                    container_port: self.container_port,
                }],
            }),
            create_time: None,
        }
    }

    /// Binding of `model_name` to an endpoint with the fixed machine sizing.
    pub fn deployed_model(&self, model_name: &str) -> DeployedModel {
        DeployedModel {
            id: String::new(),
            model: model_name.to_string(),
            display_name: self.model_display_name.clone(),
            dedicated_resources: Some(DedicatedResources {
                machine_spec: MachineSpec {
                    machine_type: self.machine_type.clone(),
                    accelerator_type: Some(self.accelerator_type.clone()),
                    accelerator_count: Some(self.accelerator_count),
                },
                min_replica_count: self.min_replica_count,
                max_replica_count: self.max_replica_count,
            }),
        }
    }

    /// All-or-nothing cutover to the newly deployed model.
    pub fn traffic_split(&self) -> BTreeMap<String, u32> {
        BTreeMap::from([(NEW_DEPLOYMENT_SLOT.to_string(), self.traffic_percent)])
    }
}
