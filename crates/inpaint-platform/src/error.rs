use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("platform API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("operation {name} failed with code {code}: {message}")]
    Operation {
        name: String,
        code: i32,
        message: String,
    },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("injected failure: {0}")]
    Injected(String),

    #[error("unexpected platform response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}
