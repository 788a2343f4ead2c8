use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use inpaint_common::{DeployConfig, DeployedModel, Endpoint, Model, Operation};

use crate::error::PlatformError;
use crate::types::{display_name_filter, DeployModelRequest, ModelPlatform};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct VertexOptions {
    /// API root without the version suffix. Defaults to the regional endpoint.
    pub api_endpoint: Option<String>,
    /// Delay between polls of a pending long-running operation.
    pub poll_interval: Duration,
}

impl Default for VertexOptions {
    fn default() -> Self {
        Self {
            api_endpoint: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Vertex AI control plane over its v1 REST surface.
#[derive(Clone)]
pub struct VertexPlatform {
    client: Client,
    base_url: String,
    parent: String,
    token: String,
    poll_interval: Duration,
}

impl VertexPlatform {
    pub fn new(config: &DeployConfig, token: String, options: VertexOptions) -> Self {
        let root = options
            .api_endpoint
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", config.region));
        Self {
            client: Client::new(),
            base_url: format!("{}/v1", root.trim_end_matches('/')),
            parent: config.parent(),
            token,
            poll_interval: options.poll_interval,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, PlatformError> {
        let resp = builder.bearer_auth(&self.token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(status = %status, error = %err, "failed to read error body");
                    String::new()
                }
            };
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(resp.json().await?)
    }

    /// Fetch every page of `collection` under the parent matching `display_name`.
    async fn list_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        display_name: &str,
    ) -> Result<Vec<T>, PlatformError> {
        let url = self.url(&format!("{}/{}", self.parent, collection));
        let filter = display_name_filter(display_name);
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.client.get(&url).query(&[("filter", filter.as_str())]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }
            let mut page: Value = self.send(req).await?;

            if let Some(items) = page.get_mut(collection).map(Value::take) {
                let items: Vec<T> = serde_json::from_value(items)?;
                out.extend(items);
            }

            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        Ok(out)
    }

    /// Poll `op` until the platform marks it done. No deadline is applied.
    async fn wait_operation(&self, mut op: Operation) -> Result<Operation, PlatformError> {
        while !op.is_done() {
            tracing::debug!(operation = %op.name, "operation pending");
            tokio::time::sleep(self.poll_interval).await;
            op = self.send(self.client.get(self.url(&op.name))).await?;
        }

        if let Some(status) = op.error.take() {
            return Err(PlatformError::Operation {
                name: op.name,
                code: status.code,
                message: status.message,
            });
        }
        Ok(op)
    }

    /// Wait for `op` and return its response payload.
    async fn operation_response(&self, op: Operation) -> Result<Value, PlatformError> {
        let op = self.wait_operation(op).await?;
        op.response_body().ok_or_else(|| {
            PlatformError::UnexpectedResponse(format!("operation {} has no response", op.name))
        })
    }
}

#[async_trait]
impl ModelPlatform for VertexPlatform {
    async fn list_models(&self, display_name: &str) -> Result<Vec<Model>, PlatformError> {
        self.list_all("models", display_name).await
    }

    async fn delete_model(&self, name: &str) -> Result<(), PlatformError> {
        let op: Operation = self.send(self.client.delete(self.url(name))).await?;
        self.wait_operation(op).await?;
        Ok(())
    }

    async fn upload_model(&self, model: &Model) -> Result<Model, PlatformError> {
        let url = self.url(&format!("{}/models:upload", self.parent));
        let body = serde_json::json!({ "model": model });
        let op: Operation = self.send(self.client.post(url).json(&body)).await?;

        let resp = self.operation_response(op).await?;
        let name = resp
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PlatformError::UnexpectedResponse("upload response has no model name".to_string())
            })?;

        self.send(self.client.get(self.url(name))).await
    }

    async fn list_endpoints(&self, display_name: &str) -> Result<Vec<Endpoint>, PlatformError> {
        self.list_all("endpoints", display_name).await
    }

    async fn create_endpoint(&self, display_name: &str) -> Result<Endpoint, PlatformError> {
        let url = self.url(&format!("{}/endpoints", self.parent));
        let body = serde_json::json!({ "displayName": display_name });
        let op: Operation = self.send(self.client.post(url).json(&body)).await?;

        let resp = self.operation_response(op).await?;
        Ok(serde_json::from_value(resp)?)
    }

    async fn deploy_model(
        &self,
        endpoint: &str,
        request: &DeployModelRequest,
    ) -> Result<DeployedModel, PlatformError> {
        let url = self.url(&format!("{endpoint}:deployModel"));
        let op: Operation = self.send(self.client.post(url).json(request)).await?;

        let mut resp = self.operation_response(op).await?;
        let deployed = resp
            .get_mut("deployedModel")
            .map(Value::take)
            .ok_or_else(|| {
                PlatformError::UnexpectedResponse("deploy response has no deployedModel".to_string())
            })?;
        Ok(serde_json::from_value(deployed)?)
    }
}

/// Prefer the platform's `{"error": {"message": ..}}` text, then the raw body,
/// then the status reason when the body is empty.
fn error_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if !message.is_empty() {
        return message;
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use axum::{Json, Router};
    use tokio::sync::Mutex;

    use inpaint_common::DeploymentProfile;

    use super::*;

    const PARENT: &str = "/v1/projects/acme-ml/locations/us-central1";

    #[derive(Debug, Clone)]
    struct Recorded {
        method: Method,
        path: String,
        query: HashMap<String, String>,
        auth: Option<String>,
        body: String,
    }

    #[derive(Clone, Default)]
    struct MockState {
        requests: Arc<Mutex<Vec<Recorded>>>,
        upload_polls: Arc<AtomicUsize>,
    }

    async fn mock_vertex(
        State(state): State<MockState>,
        method: Method,
        uri: Uri,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, Json<Value>) {
        let path = uri.path().to_string();
        state.requests.lock().await.push(Recorded {
            method: method.clone(),
            path: path.clone(),
            query: query.clone(),
            auth: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });

        let ok = |v: Value| (StatusCode::OK, Json(v));
        let models_path = format!("{PARENT}/models");
        let endpoints_path = format!("{PARENT}/endpoints");
        let upload_path = format!("{PARENT}/models:upload");
        let upload_op = format!("{PARENT}/operations/upload-1");
        let deploy_path = format!("{PARENT}/endpoints/42:deployModel");

        match (method, path.as_str()) {
            (Method::GET, p) if p == models_path => match query.get("pageToken").map(String::as_str) {
                None => ok(serde_json::json!({
                    "models": [{ "name": "projects/acme-ml/locations/us-central1/models/1", "displayName": "inpainting-model" }],
                    "nextPageToken": "page-2"
                })),
                Some("page-2") => ok(serde_json::json!({
                    "models": [{ "name": "projects/acme-ml/locations/us-central1/models/2", "displayName": "inpainting-model" }]
                })),
                Some(_) => ok(serde_json::json!({})),
            },
            (Method::GET, p) if p == endpoints_path => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({
                    "error": { "code": 403, "message": "Permission denied on resource", "status": "PERMISSION_DENIED" }
                })),
            ),
            (Method::POST, p) if p == upload_path => ok(serde_json::json!({
                "name": "projects/acme-ml/locations/us-central1/operations/upload-1"
            })),
            (Method::GET, p) if p == upload_op => {
                let polls = state.upload_polls.fetch_add(1, Ordering::SeqCst) + 1;
                if polls < 2 {
                    ok(serde_json::json!({ "name": "projects/acme-ml/locations/us-central1/operations/upload-1" }))
                } else {
                    ok(serde_json::json!({
                        "name": "projects/acme-ml/locations/us-central1/operations/upload-1",
                        "done": true,
                        "response": {
                            "@type": "type.googleapis.com/google.cloud.aiplatform.v1.UploadModelResponse",
                            "model": "projects/acme-ml/locations/us-central1/models/9"
                        }
                    }))
                }
            }
            (Method::GET, p) if p == format!("{PARENT}/models/9") => ok(serde_json::json!({
                "name": "projects/acme-ml/locations/us-central1/models/9",
                "displayName": "inpainting-model",
                "containerSpec": { "imageUri": "us-central1-docker.pkg.dev/acme-ml/serving/inpaint:v3" }
            })),
            (Method::DELETE, p) if p == format!("{PARENT}/models/5") => ok(serde_json::json!({
                "name": "projects/acme-ml/locations/us-central1/operations/delete-5",
                "done": true,
                "error": { "code": 9, "message": "model has deployed models" }
            })),
            (Method::POST, p) if p == endpoints_path => ok(serde_json::json!({
                "name": "projects/acme-ml/locations/us-central1/operations/create-ep-1",
                "done": true,
                "response": {
                    "@type": "type.googleapis.com/google.cloud.aiplatform.v1.Endpoint",
                    "name": "projects/acme-ml/locations/us-central1/endpoints/42",
                    "displayName": "inpainting-endpoint"
                }
            })),
            (Method::DELETE, p) if p == format!("{PARENT}/models/1") => ok(serde_json::json!({
                "name": "projects/acme-ml/locations/us-central1/operations/delete-1"
            })),
            (Method::GET, p) if p == format!("{PARENT}/operations/delete-1") => ok(serde_json::json!({
                "name": "projects/acme-ml/locations/us-central1/operations/delete-1",
                "done": true,
                "response": {
                    "@type": "type.googleapis.com/google.protobuf.Empty"
                }
            })),
            (Method::POST, p) if p == deploy_path => ok(serde_json::json!({
                "name": "projects/acme-ml/locations/us-central1/operations/deploy-1",
                "done": true,
                "response": {
                    "@type": "type.googleapis.com/google.cloud.aiplatform.v1.DeployModelResponse",
                    "deployedModel": { "id": "777", "model": "projects/acme-ml/locations/us-central1/models/9" }
                }
            })),
            _ => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": { "code": 404, "message": "no such route" } })),
            ),
        }
    }

    async fn start_mock() -> (VertexPlatform, MockState) {
        let state = MockState::default();
        let app = Router::new().fallback(mock_vertex).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let config = DeployConfig {
            project_id: "acme-ml".to_string(),
            region: "us-central1".to_string(),
            repository: "serving".to_string(),
            image_name: "inpaint".to_string(),
            image_tag: "v3".to_string(),
        };
        let platform = VertexPlatform::new(
            &config,
            "test-token".to_string(),
            VertexOptions {
                api_endpoint: Some(format!("http://{addr}/")),
                poll_interval: Duration::from_millis(5),
            },
        );
        (platform, state)
    }

    #[test]
    fn test_default_base_url_is_regional() {
        let config = DeployConfig {
            project_id: "p".to_string(),
            region: "europe-west4".to_string(),
            repository: "r".to_string(),
            image_name: "i".to_string(),
            image_tag: "t".to_string(),
        };
        let platform = VertexPlatform::new(&config, "t".to_string(), VertexOptions::default());
        assert_eq!(
            platform.base_url(),
            "https://europe-west4-aiplatform.googleapis.com/v1"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(
                reqwest::StatusCode::NOT_FOUND,
                r#"{"error":{"code":404,"message":"Model not found"}}"#
            ),
            "Model not found"
        );
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_GATEWAY, "  upstream timeout \n"),
            "upstream timeout"
        );
        assert_eq!(
            error_message(reqwest::StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }

    #[tokio::test]
    async fn test_list_models_follows_pages_with_filter_and_token() {
        let (platform, state) = start_mock().await;

        let models = platform.list_models("inpainting-model").await.unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "projects/acme-ml/locations/us-central1/models/1",
                "projects/acme-ml/locations/us-central1/models/2",
            ]
        );

        let requests = state.requests.lock().await;
        assert_eq!(requests.len(), 2);
        for req in requests.iter() {
            assert_eq!(req.query.get("filter").unwrap(), "display_name=\"inpainting-model\"");
            assert_eq!(req.auth.as_deref(), Some("Bearer test-token"));
        }
        assert_eq!(requests[1].query.get("pageToken").unwrap(), "page-2");
    }

    #[tokio::test]
    async fn test_upload_polls_operation_then_fetches_model() {
        let (platform, state) = start_mock().await;

        let model = DeploymentProfile::default()
            .model_for_image("us-central1-docker.pkg.dev/acme-ml/serving/inpaint:v3");
        let uploaded = platform.upload_model(&model).await.unwrap();

        assert_eq!(uploaded.name, "projects/acme-ml/locations/us-central1/models/9");
        assert_eq!(state.upload_polls.load(Ordering::SeqCst), 2);

        let requests = state.requests.lock().await;
        let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
        let spec = &sent["model"]["containerSpec"];
        assert_eq!(spec["predictRoute"], "/inpaint");
        assert_eq!(spec["healthRoute"], "/");
        assert_eq!(spec["ports"][0]["containerPort"], 8080);
    }

    #[tokio::test]
    async fn test_failed_delete_operation_is_an_error() {
        let (platform, _state) = start_mock().await;

        let err = platform
            .delete_model("projects/acme-ml/locations/us-central1/models/5")
            .await
            .unwrap_err();
        match err {
            PlatformError::Operation { code, message, .. } => {
                assert_eq!(code, 9);
                assert_eq!(message, "model has deployed models");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_endpoint_sends_display_name_and_decodes_response() {
        let (platform, state) = start_mock().await;

        let endpoint = platform.create_endpoint("inpainting-endpoint").await.unwrap();
        assert_eq!(endpoint.name, "projects/acme-ml/locations/us-central1/endpoints/42");
        assert_eq!(endpoint.display_name, "inpainting-endpoint");

        let requests = state.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(
            requests[0].path,
            "/v1/projects/acme-ml/locations/us-central1/endpoints"
        );
        let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent, serde_json::json!({ "displayName": "inpainting-endpoint" }));
    }

    #[tokio::test]
    async fn test_delete_waits_for_operation_to_finish() {
        let (platform, state) = start_mock().await;

        platform
            .delete_model("projects/acme-ml/locations/us-central1/models/1")
            .await
            .unwrap();

        let requests = state.requests.lock().await;
        let calls: Vec<_> = requests
            .iter()
            .map(|r| (r.method.clone(), r.path.as_str()))
            .collect();
        assert_eq!(
            calls,
            vec![
                (Method::DELETE, "/v1/projects/acme-ml/locations/us-central1/models/1"),
                (Method::GET, "/v1/projects/acme-ml/locations/us-central1/operations/delete-1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_http_error_maps_to_api_error() {
        let (platform, _state) = start_mock().await;

        let err = platform.list_endpoints("inpainting-endpoint").await.unwrap_err();
        match err {
            PlatformError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Permission denied on resource");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deploy_sends_traffic_split_and_returns_deployed_model() {
        let (platform, state) = start_mock().await;

        let profile = DeploymentProfile::default();
        let request = DeployModelRequest {
            deployed_model: profile.deployed_model("projects/acme-ml/locations/us-central1/models/9"),
            traffic_split: profile.traffic_split(),
        };
        let deployed = platform
            .deploy_model("projects/acme-ml/locations/us-central1/endpoints/42", &request)
            .await
            .unwrap();
        assert_eq!(deployed.id, "777");

        let requests = state.requests.lock().await;
        let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent["trafficSplit"]["0"], 100);
        assert_eq!(
            sent["deployedModel"]["dedicatedResources"]["machineSpec"]["acceleratorCount"],
            1
        );
    }
}
