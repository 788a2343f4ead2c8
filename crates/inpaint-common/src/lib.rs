pub mod config;
pub mod endpoint;
pub mod model;
pub mod operation;
pub mod profile;

pub use config::{ConfigError, DeployConfig, REQUIRED_VARS};
pub use endpoint::{DedicatedResources, DeployedModel, Endpoint, MachineSpec};
pub use model::{ContainerSpec, Model, Port};
pub use operation::{Operation, OperationStatus};
pub use profile::DeploymentProfile;

pub mod telemetry;
