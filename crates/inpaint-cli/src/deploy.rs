use std::future::Future;

use anyhow::{Context, Result};

use inpaint_common::{DeployConfig, DeploymentProfile};
use inpaint_platform::{DeployModelRequest, ModelPlatform};

/// What a deployment run changed on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub image_uri: String,
    pub deleted_model: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub endpoint_created: bool,
    pub deployed_model_id: String,
}

/// Load the deployment variables through `lookup`, then connect and deploy.
///
/// `connect` is only invoked once every required variable is present, so a
/// misconfigured run makes no remote call and fetches no credentials.
pub async fn deploy_with<L, C, Fut, P>(
    lookup: L,
    connect: C,
    profile: &DeploymentProfile,
) -> Result<DeployOutcome>
where
    L: Fn(&str) -> Option<String>,
    C: FnOnce(&DeployConfig) -> Fut,
    Fut: Future<Output = Result<P>>,
    P: ModelPlatform,
{
    let config = DeployConfig::from_lookup(lookup)?;
    tracing::info!(
        project = %config.project_id,
        region = %config.region,
        "starting deployment"
    );

    let platform = connect(&config).await?;
    run_deploy(&platform, &config, profile).await
}

/// Replace the model, resolve the endpoint and cut all traffic over to the new model.
///
/// Steps run strictly in order and the first failure aborts the run; side
/// effects of completed steps (e.g. a deleted model) are left in place.
pub async fn run_deploy<P>(
    platform: &P,
    config: &DeployConfig,
    profile: &DeploymentProfile,
) -> Result<DeployOutcome>
where
    P: ModelPlatform + ?Sized,
{
    let image_uri = config.image_uri();
    println!("Deploying image: {image_uri}");

    let deleted_model = remove_previous_model(platform, profile).await?;

    println!("Uploading model to Vertex AI...");
    let model = platform
        .upload_model(&profile.model_for_image(&image_uri))
        .await
        .context("failed to upload model")?;
    println!("Model uploaded: {}", model.name);
    tracing::info!(model = %model.name, image = %image_uri, "model uploaded");

    println!("Creating or getting endpoint...");
    let (endpoint, endpoint_created) = resolve_endpoint(platform, profile).await?;

    println!("Deploying model to endpoint...");
    let request = DeployModelRequest {
        deployed_model: profile.deployed_model(&model.name),
        traffic_split: profile.traffic_split(),
    };
    let deployed = platform
        .deploy_model(&endpoint, &request)
        .await
        .with_context(|| format!("failed to deploy model to {endpoint}"))?;
    tracing::info!(
        endpoint = %endpoint,
        deployed_model_id = %deployed.id,
        machine_type = %profile.machine_type,
        accelerator = %profile.accelerator_type,
        "model deployed"
    );
    println!("Deployment to Vertex AI Endpoint completed successfully!");

    Ok(DeployOutcome {
        image_uri,
        deleted_model,
        model: model.name,
        endpoint,
        endpoint_created,
        deployed_model_id: deployed.id,
    })
}

/// Delete the first model carrying the profile's display name, if any.
async fn remove_previous_model<P>(platform: &P, profile: &DeploymentProfile) -> Result<Option<String>>
where
    P: ModelPlatform + ?Sized,
{
    let models = platform
        .list_models(&profile.model_display_name)
        .await
        .context("failed to list models")?;

    let Some(previous) = models.first() else {
        tracing::debug!(display_name = %profile.model_display_name, "no previous model");
        return Ok(None);
    };
    if models.len() > 1 {
        // only the first listed model is replaced; the rest are left as they are
        tracing::warn!(
            display_name = %profile.model_display_name,
            count = models.len(),
            "several models share the display name, deleting the first only"
        );
    }

    println!("Deleting existing model version: {}", previous.name);
    platform
        .delete_model(&previous.name)
        .await
        .with_context(|| format!("failed to delete model {}", previous.name))?;
    println!("Old model deleted.");
    tracing::info!(model = %previous.name, "previous model deleted");

    Ok(Some(previous.name.clone()))
}

/// Reuse the first endpoint with the profile's display name or create one.
async fn resolve_endpoint<P>(platform: &P, profile: &DeploymentProfile) -> Result<(String, bool)>
where
    P: ModelPlatform + ?Sized,
{
    let endpoints = platform
        .list_endpoints(&profile.endpoint_display_name)
        .await
        .context("failed to list endpoints")?;

    if let Some(existing) = endpoints.into_iter().next() {
        println!("Using existing endpoint: {}", existing.name);
        return Ok((existing.name, false));
    }

    let created = platform
        .create_endpoint(&profile.endpoint_display_name)
        .await
        .context("failed to create endpoint")?;
    println!("Endpoint created: {}", created.name);
    tracing::info!(endpoint = %created.name, "endpoint created");
    Ok((created.name, true))
}
