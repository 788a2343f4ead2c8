use thiserror::Error;

pub const ENV_PROJECT_ID: &str = "GCP_PROJECT_ID";
pub const ENV_REGION: &str = "GCP_REGION";
pub const ENV_REPOSITORY: &str = "ARTIFACT_REGISTRY_REPO";
pub const ENV_IMAGE_NAME: &str = "IMAGE_NAME";
pub const ENV_IMAGE_TAG: &str = "IMAGE_TAG";

/// Environment variables that must be set before any remote call is made.
pub const REQUIRED_VARS: [&str; 5] = [
    ENV_PROJECT_ID,
    ENV_REGION,
    ENV_REPOSITORY,
    ENV_IMAGE_NAME,
    ENV_IMAGE_TAG,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Where the image lives and which project/region receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub project_id: String,
    pub region: String,
    pub repository: String,
    pub image_name: String,
    pub image_tag: String,
}

impl DeployConfig {
    /// Resolve every required variable through `lookup`.
    ///
    /// Only presence is checked: an empty value is accepted as-is.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::MissingVar(key));

        Ok(Self {
            project_id: require(ENV_PROJECT_ID)?,
            region: require(ENV_REGION)?,
            repository: require(ENV_REPOSITORY)?,
            image_name: require(ENV_IMAGE_NAME)?,
            image_tag: require(ENV_IMAGE_TAG)?,
        })
    }

    /// Fully-qualified Artifact Registry reference of the serving image.
    pub fn image_uri(&self) -> String {
        format!(
            "{}-docker.pkg.dev/{}/{}/{}:{}",
            self.region, self.project_id, self.repository, self.image_name, self.image_tag
        )
    }

    /// Resource parent under which models and endpoints are listed and created.
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.region)
    }
}
