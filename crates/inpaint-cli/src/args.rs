use clap::Parser;

/// The deployment target itself (project, region, image) is read from
/// GCP_PROJECT_ID, GCP_REGION, ARTIFACT_REGISTRY_REPO, IMAGE_NAME and IMAGE_TAG.
#[derive(Debug, Parser)]
#[command(name = "inpaint-deploy")]
#[command(about = "Deploy the inpainting serving image to a Vertex AI endpoint", long_about = None)]
pub struct Args {
    /// API root, e.g. https://us-central1-aiplatform.googleapis.com (default: regional endpoint)
    #[arg(long, env = "INPAINT_API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// OAuth2 access token; falls back to `gcloud auth print-access-token`
    #[arg(long, env = "GCP_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Seconds between polls of a pending platform operation
    #[arg(long, env = "INPAINT_POLL_INTERVAL", default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// OTLP/HTTP endpoint for trace export
    #[arg(long, env = "INPAINT_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Bearer token for the OTLP endpoint
    #[arg(long, env = "INPAINT_OTLP_TOKEN", hide_env_values = true)]
    pub otlp_token: Option<String>,
}
