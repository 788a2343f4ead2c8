mod args;
mod config;
mod deploy;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use inpaint_common::telemetry::init_tracing;
use inpaint_common::{DeployConfig, DeploymentProfile};
use inpaint_platform::{resolve_access_token, VertexPlatform};

use crate::args::Args;
use crate::config::{build_telemetry_config, build_vertex_options};
use crate::deploy::deploy_with;
use crate::output::print_outcome;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let provider = init_tracing(&build_telemetry_config(&args));

    let result = run(&args).await;

    if let Some(provider) = provider {
        if let Err(err) = provider.shutdown() {
            eprintln!("failed to flush traces: {err}");
        }
    }
    result
}

async fn run(args: &Args) -> Result<()> {
    let profile = DeploymentProfile::default();

    let outcome = deploy_with(
        |key| std::env::var(key).ok(),
        |config: &DeployConfig| {
            let config = config.clone();
            async move {
                let token = resolve_access_token(args.access_token.as_deref())
                    .await
                    .context("could not obtain an access token")?;
                let platform = VertexPlatform::new(&config, token, build_vertex_options(args));
                Ok::<_, anyhow::Error>(platform)
            }
        },
        &profile,
    )
    .await?;

    print_outcome(&outcome, &profile);
    Ok(())
}
