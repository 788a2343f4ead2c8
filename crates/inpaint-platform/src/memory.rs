use std::sync::Arc;

use tokio::sync::RwLock;

use inpaint_common::profile::NEW_DEPLOYMENT_SLOT;
use inpaint_common::{DeployedModel, Endpoint, Model};

use crate::error::PlatformError;
use crate::types::{DeployModelRequest, ModelPlatform};

const PARENT: &str = "projects/memory/locations/local";

/// One call made against a [`MemoryPlatform`], in the order it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    ListModels { display_name: String },
    DeleteModel { name: String },
    UploadModel { display_name: String, image_uri: String },
    ListEndpoints { display_name: String },
    CreateEndpoint { display_name: String },
    DeployModel { endpoint: String, request: DeployModelRequest },
}

/// In-process control plane that keeps resources in memory and records calls.
#[derive(Debug, Clone)]
pub struct MemoryPlatform {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    models: Vec<Model>,
    endpoints: Vec<Endpoint>,
    calls: Vec<PlatformCall>,
    delete_failure: Option<String>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Seed a model resource and return its name.
    pub async fn insert_model(&self, display_name: &str) -> String {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let name = format!("{PARENT}/models/{id}");
        inner.models.push(Model {
            name: name.clone(),
            display_name: display_name.to_string(),
            container_spec: None,
            create_time: None,
        });
        name
    }

    /// Seed an endpoint resource and return its name.
    pub async fn insert_endpoint(&self, display_name: &str) -> String {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let name = format!("{PARENT}/endpoints/{id}");
        inner.endpoints.push(Endpoint {
            name: name.clone(),
            display_name: display_name.to_string(),
            traffic_split: Default::default(),
            deployed_models: Vec::new(),
        });
        name
    }

    /// Make every subsequent delete fail with `message`.
    pub async fn fail_deletes(&self, message: &str) {
        self.inner.write().await.delete_failure = Some(message.to_string());
    }

    pub async fn calls(&self) -> Vec<PlatformCall> {
        self.inner.read().await.calls.clone()
    }

    pub async fn models(&self) -> Vec<Model> {
        self.inner.read().await.models.clone()
    }

    pub async fn endpoints(&self) -> Vec<Endpoint> {
        self.inner.read().await.endpoints.clone()
    }
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ModelPlatform for MemoryPlatform {
    async fn list_models(&self, display_name: &str) -> Result<Vec<Model>, PlatformError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(PlatformCall::ListModels {
            display_name: display_name.to_string(),
        });
        Ok(inner
            .models
            .iter()
            .filter(|m| m.display_name == display_name)
            .cloned()
            .collect())
    }

    async fn delete_model(&self, name: &str) -> Result<(), PlatformError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(PlatformCall::DeleteModel {
            name: name.to_string(),
        });

        if let Some(message) = &inner.delete_failure {
            return Err(PlatformError::Injected(message.clone()));
        }
        let deployed = inner
            .endpoints
            .iter()
            .any(|ep| ep.deployed_models.iter().any(|dm| dm.model == name));
        if deployed {
            return Err(PlatformError::FailedPrecondition(format!(
                "model {name} is deployed to an endpoint"
            )));
        }

        let before = inner.models.len();
        inner.models.retain(|m| m.name != name);
        if inner.models.len() == before {
            return Err(PlatformError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn upload_model(&self, model: &Model) -> Result<Model, PlatformError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(PlatformCall::UploadModel {
            display_name: model.display_name.clone(),
            image_uri: model
                .container_spec
                .as_ref()
                .map(|c| c.image_uri.clone())
                .unwrap_or_default(),
        });

        let id = inner.next_id();
        let mut created = model.clone();
        created.name = format!("{PARENT}/models/{id}");
        inner.models.push(created.clone());
        Ok(created)
    }

    async fn list_endpoints(&self, display_name: &str) -> Result<Vec<Endpoint>, PlatformError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(PlatformCall::ListEndpoints {
            display_name: display_name.to_string(),
        });
        Ok(inner
            .endpoints
            .iter()
            .filter(|ep| ep.display_name == display_name)
            .cloned()
            .collect())
    }

    async fn create_endpoint(&self, display_name: &str) -> Result<Endpoint, PlatformError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(PlatformCall::CreateEndpoint {
            display_name: display_name.to_string(),
        });

        let id = inner.next_id();
        let endpoint = Endpoint {
            name: format!("{PARENT}/endpoints/{id}"),
            display_name: display_name.to_string(),
            traffic_split: Default::default(),
            deployed_models: Vec::new(),
        };
        inner.endpoints.push(endpoint.clone());
        Ok(endpoint)
    }

    async fn deploy_model(
        &self,
        endpoint: &str,
        request: &DeployModelRequest,
    ) -> Result<DeployedModel, PlatformError> {
        let mut inner = self.inner.write().await;
        inner.calls.push(PlatformCall::DeployModel {
            endpoint: endpoint.to_string(),
            request: request.clone(),
        });

        let model = &request.deployed_model.model;
        if !inner.models.iter().any(|m| &m.name == model) {
            return Err(PlatformError::NotFound(model.clone()));
        }

        let id = inner.next_id().to_string();
        let ep = inner
            .endpoints
            .iter_mut()
            .find(|ep| ep.name == endpoint)
            .ok_or_else(|| PlatformError::NotFound(endpoint.to_string()))?;

        let mut deployed = request.deployed_model.clone();
        deployed.id = id.clone();

        // Entries absent from the request's split lose their traffic.
        ep.traffic_split = request
            .traffic_split
            .iter()
            .map(|(slot, pct)| {
                let key = if slot == NEW_DEPLOYMENT_SLOT {
                    id.clone()
                } else {
                    slot.clone()
                };
                (key, *pct)
            })
            .collect();
        ep.deployed_models.push(deployed.clone());
        Ok(deployed)
    }
}
