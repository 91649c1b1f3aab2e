//! Output formatting utilities

use clap::ValueEnum;
use colored::{Color, Colorize};
use rollout_lib::{DeploymentDescriptor, DeploymentStatus};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

/// Output format for inspect
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// One colored line per deployment (default)
    #[default]
    Colorized,
    /// Table format
    Table,
    /// JSON format
    Json,
}

/// Row for the deployments table
#[derive(Tabled)]
struct DeploymentRow {
    #[tabled(rename = "Model ID")]
    model: String,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Scale")]
    scale: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Deployed")]
    deployed: String,
    #[tabled(rename = "Errors")]
    errors: String,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Problems worth flagging next to a deployment
pub fn deployment_errors(deployment: &DeploymentDescriptor) -> String {
    if deployment.model_api_ok {
        String::new()
    } else {
        "ERROR: MODEL API DOES NOT RESPOND".to_string()
    }
}

/// Line color: green when healthy, yellow on warning, red otherwise
pub fn line_color(deployment: &DeploymentDescriptor) -> Color {
    if deployment.is_healthy() {
        Color::Green
    } else if deployment.status == DeploymentStatus::Warning {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Color status based on value
pub fn color_status(status: DeploymentStatus) -> String {
    match status {
        DeploymentStatus::Ok => status.as_str().green().to_string(),
        DeploymentStatus::Warning => status.as_str().yellow().to_string(),
        DeploymentStatus::Failing => status.as_str().red().to_string(),
    }
}

/// One colored summary line for a deployment
pub fn deployment_line(deployment: &DeploymentDescriptor) -> String {
    let color = line_color(deployment);
    let ready = format!(
        "{} / {} pods ready {}",
        deployment.ready_replicas,
        deployment.scale,
        deployment_errors(deployment)
    );
    format!(
        "{} {} {} (version: {}) - {}",
        "*".color(color),
        deployment.model.underline(),
        deployment.image,
        deployment.version,
        ready.trim_end().color(color)
    )
}

/// Render deployments as a table
pub fn deployments_table(deployments: &[DeploymentDescriptor]) -> String {
    let rows: Vec<DeploymentRow> = deployments
        .iter()
        .map(|d| DeploymentRow {
            model: d.model.clone(),
            image: d.image.clone(),
            version: d.version.clone(),
            ready: d.ready_replicas.to_string(),
            scale: d.scale.to_string(),
            status: color_status(d.status),
            deployed: d
                .deploy_time
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_default(),
            errors: deployment_errors(d),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print deployments in the requested format
pub fn print_deployments(deployments: &[DeploymentDescriptor], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(deployments) {
                println!("{}", json);
            }
        }
        OutputFormat::Table => {
            if deployments.is_empty() {
                print_warning("cannot find any model deployments");
                return;
            }
            println!("{}", deployments_table(deployments));
        }
        OutputFormat::Colorized => {
            if deployments.is_empty() {
                print_warning("cannot find any model deployments");
                return;
            }
            println!("{}", "Model deployments:".bold());
            for deployment in deployments {
                println!("{}", deployment_line(deployment));
            }
        }
    }
}

/// Format timestamp for display
pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}

/// Format a wait duration as seconds
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}
