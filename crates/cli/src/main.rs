//! Model rollout CLI
//!
//! Deploys, scales and undeploys models through the deployment service and
//! waits until each change is confirmed by the service's status listing.

mod commands;
mod config;
mod output;
mod progress;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use commands::{inspect, mutate};
use rollout_lib::{
    CancellationToken, DeployRequest, EdiClient, Mutation, ScaleRequest, UndeployRequest,
};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Model rollout CLI
#[derive(Parser)]
#[command(name = "rollout")]
#[command(author, version, about = "CLI for model deployment rollouts", long_about = None)]
pub struct Cli {
    /// Deployment service URL (can also be set via ROLLOUT_API_URL env var)
    #[arg(long, global = true, env = "ROLLOUT_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the deployment service
    #[arg(long, global = true, env = "ROLLOUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable verbose log output (VERBOSE accepts 1/0, yes/no, true/false)
    #[arg(
        long,
        short,
        global = true,
        env = "VERBOSE",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a model image
    Deploy {
        /// Docker image of the model
        image: String,

        /// Count of instances
        #[arg(long, default_value_t = 1)]
        scale: u32,

        /// IAM role to be used by the model pods
        #[arg(long)]
        model_iam_role: Option<String>,

        /// Model startup timeout for the liveness probe, seconds
        #[arg(long = "livenesstimeout", default_value_t = 2)]
        liveness_timeout: u32,

        /// Model startup timeout for the readiness probe, seconds
        #[arg(long = "readinesstimeout", default_value_t = 2)]
        readiness_timeout: u32,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Change the count of model pods
    Scale {
        /// Model ID
        model_id: String,

        /// New count of replicas
        scale: u32,

        /// Model version
        #[arg(long)]
        model_version: Option<String>,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Undeploy a model deployment
    Undeploy {
        /// Model ID
        model_id: String,

        /// Model version
        #[arg(long)]
        model_version: Option<String>,

        /// Removal grace period, seconds
        #[arg(long, default_value_t = 0)]
        grace_period: u32,

        /// Do not fail if the model cannot be found
        #[arg(long)]
        ignore_not_found: bool,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Get information about currently deployed models
    Inspect {
        /// Model ID
        #[arg(long)]
        model_id: Option<String>,

        /// Model version
        #[arg(long)]
        model_version: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value_t)]
        format: output::OutputFormat,
    },
}

/// Options controlling confirmation of a mutation
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Do not wait for the operation to be confirmed
    #[arg(long)]
    pub no_wait: bool,

    /// Seconds to wait for confirmation (default: 300)
    #[arg(long, allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Stop waiting on the first failed status query
    #[arg(long)]
    pub fail_fast: bool,
}

/// Logs go to stderr so command output stays clean
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = config::CliConfig::load()?;

    // Initialize client
    let client = EdiClient::new(&config.api_url(cli.api_url), config.token(cli.token))
        .context("Failed to create deployment service client")?;

    // Ctrl-C stops a pending wait; the requested change itself is not rolled back
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping wait");
            interrupt.cancel();
        }
    });

    // Execute command
    match cli.command {
        Commands::Deploy {
            image,
            scale,
            model_iam_role,
            liveness_timeout,
            readiness_timeout,
            wait,
        } => {
            let mutation = Mutation::Deploy(DeployRequest {
                image,
                model_iam_role,
                scale,
                liveness_timeout,
                readiness_timeout,
            });
            mutate::run(&client, mutation, &wait, &config, cancel).await?;
        }
        Commands::Scale {
            model_id,
            scale,
            model_version,
            wait,
        } => {
            let mutation = Mutation::Scale(ScaleRequest {
                model_id,
                model_version,
                scale,
            });
            mutate::run(&client, mutation, &wait, &config, cancel).await?;
        }
        Commands::Undeploy {
            model_id,
            model_version,
            grace_period,
            ignore_not_found,
            wait,
        } => {
            let mutation = Mutation::Undeploy(UndeployRequest {
                model_id,
                model_version,
                grace_period,
                ignore_not_found,
            });
            mutate::run(&client, mutation, &wait, &config, cancel).await?;
        }
        Commands::Inspect {
            model_id,
            model_version,
            format,
        } => {
            inspect::show_deployments(
                &client,
                model_id.as_deref(),
                model_version.as_deref(),
                format,
            )
            .await?;
        }
    }

    Ok(())
}
