use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use inpaint_common::{DeployedModel, Endpoint, Model};

use crate::error::PlatformError;

/// Body of a deploy-model call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployModelRequest {
    pub deployed_model: DeployedModel,
    pub traffic_split: BTreeMap<String, u32>,
}

/// Control-plane operations the deployment needs.
///
/// Every mutating call returns only after the platform reports the underlying
/// operation as finished.
#[async_trait]
pub trait ModelPlatform: Send + Sync {
    /// Models whose display name equals `display_name`, in platform order.
    async fn list_models(&self, display_name: &str) -> Result<Vec<Model>, PlatformError>;
    async fn delete_model(&self, name: &str) -> Result<(), PlatformError>;
    /// Register `model` and return it with its platform-assigned name.
    async fn upload_model(&self, model: &Model) -> Result<Model, PlatformError>;

    /// Endpoints whose display name equals `display_name`, in platform order.
    async fn list_endpoints(&self, display_name: &str) -> Result<Vec<Endpoint>, PlatformError>;
    async fn create_endpoint(&self, display_name: &str) -> Result<Endpoint, PlatformError>;

    async fn deploy_model(
        &self,
        endpoint: &str,
        request: &DeployModelRequest,
    ) -> Result<DeployedModel, PlatformError>;
}

/// Filter expression matching an exact display name.
pub fn display_name_filter(display_name: &str) -> String {
    format!("display_name=\"{display_name}\"")
}
