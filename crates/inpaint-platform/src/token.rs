use tokio::process::Command;

use crate::error::PlatformError;

/// Bearer token for the platform API.
///
/// An explicitly supplied token wins; otherwise the active gcloud credentials
/// are asked for one.
pub async fn resolve_access_token(explicit: Option<&str>) -> Result<String, PlatformError> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        tracing::debug!("using access token from flag/environment");
        return Ok(token.to_string());
    }

    tracing::debug!("requesting access token from gcloud");
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| PlatformError::Auth(format!("failed to run gcloud: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PlatformError::Auth(format!(
            "gcloud auth print-access-token exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    parse_token_output(&output.stdout)
}

fn parse_token_output(stdout: &[u8]) -> Result<String, PlatformError> {
    let token = String::from_utf8_lossy(stdout).trim().to_string();
    if token.is_empty() {
        return Err(PlatformError::Auth("gcloud returned an empty token".to_string()));
    }
    Ok(token)
}
