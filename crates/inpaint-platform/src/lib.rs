pub mod error;
pub mod memory;
pub mod token;
pub mod types;
pub mod vertex;

pub use error::PlatformError;
pub use memory::{MemoryPlatform, PlatformCall};
pub use token::resolve_access_token;
pub use types::{DeployModelRequest, ModelPlatform};
pub use vertex::{VertexOptions, VertexPlatform};
