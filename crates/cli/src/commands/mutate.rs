//! Deploy, scale and undeploy commands

use anyhow::Result;
use colored::Colorize;
use rollout_lib::{
    CancellationToken, Confirmation, EdiClient, Mutation, Orchestrator, RolloutError,
    RolloutOptions, TracingObserver,
};

use crate::config::CliConfig;
use crate::output::{deployments_table, format_elapsed, print_info, print_success};
use crate::progress::ProgressObserver;
use crate::WaitArgs;

/// Send `mutation` and wait for it according to `wait`
pub async fn run(
    client: &EdiClient,
    mutation: Mutation,
    wait: &WaitArgs,
    config: &CliConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let operation = mutation.kind();
    let options = RolloutOptions::new(config.wait_config(wait), wait.no_wait);
    let observer = (
        TracingObserver::new(operation.as_str()),
        ProgressObserver::new(operation, requested_scale(&mutation)),
    );

    let result = Orchestrator::new(client, client)
        .observer(&observer)
        .cancellation(cancel)
        .execute(&mutation, &options)
        .await;

    match result {
        Ok(confirmation) => {
            print_confirmation(&confirmation, wait.no_wait);
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}

fn requested_scale(mutation: &Mutation) -> Option<u32> {
    match mutation {
        Mutation::Deploy(req) => Some(req.scale),
        Mutation::Scale(req) => Some(req.scale),
        Mutation::Undeploy(_) => None,
    }
}

fn print_confirmation(confirmation: &Confirmation, no_wait: bool) {
    let mut keys: Vec<String> = confirmation
        .affected
        .iter()
        .map(|d| d.key().to_string())
        .collect();
    keys.sort();
    keys.dedup();

    if no_wait {
        print_success(&format!(
            "{} request accepted for {} deployment(s), not waiting for confirmation",
            confirmation.operation,
            keys.len()
        ));
    } else {
        print_success(&format!(
            "{} confirmed ({}) after {} poll(s) in {}",
            confirmation.operation,
            confirmation.predicate,
            confirmation.report.polls,
            format_elapsed(confirmation.report.elapsed)
        ));
    }

    for key in keys {
        println!("  {}", key.cyan());
    }
}

fn report_failure(err: &RolloutError) {
    if let RolloutError::TimedOut { report, .. } = err {
        if !report.last_snapshot.is_empty() {
            println!("{}", "Last observed status:".bold());
            println!("{}", deployments_table(&report.last_snapshot));
        }
        if let Some(last_error) = &report.last_error {
            print_info(&format!("Last status query error: {}", last_error));
        }
    }

    if err.needs_inspection() {
        print_info("The operation may still complete; run `rollout inspect` to check the deployments");
    }
}
