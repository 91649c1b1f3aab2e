//! Inspect command

use anyhow::{Context, Result};
use rollout_lib::EdiClient;
use tracing::info;

use crate::output::{print_deployments, OutputFormat};

/// Show deployments known to the service, optionally narrowed by model and version
pub async fn show_deployments(
    client: &EdiClient,
    model_id: Option<&str>,
    model_version: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    info!(url = %client.base_url(), "Sending inspect request");
    let deployments = client
        .inspect(model_id, model_version)
        .await
        .context("Failed to inspect model deployments")?;

    print_deployments(&deployments, format);
    Ok(())
}
