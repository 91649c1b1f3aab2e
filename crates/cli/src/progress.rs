//! Terminal progress reporting while a mutation is being confirmed

use rollout_lib::{
    AffectedSet, DeploymentDescriptor, OperationKind, ServiceError, WaitObserver,
};
use std::time::Duration;

use crate::output::{format_elapsed, print_info, print_warning};

/// Prints one line per status poll
pub struct ProgressObserver {
    operation: OperationKind,
    expected_scale: Option<u32>,
}

impl ProgressObserver {
    pub fn new(operation: OperationKind, expected_scale: Option<u32>) -> Self {
        Self {
            operation,
            expected_scale,
        }
    }

    fn summary(&self, snapshot: &[DeploymentDescriptor]) -> String {
        match (self.operation, self.expected_scale) {
            (OperationKind::Undeploy, _) => {
                format!("{} deployment(s) still present", snapshot.len())
            }
            (_, Some(scale)) => {
                let done = snapshot
                    .iter()
                    .filter(|d| d.ready_replicas == scale && d.model_api_ok)
                    .count();
                format!(
                    "{}/{} deployment(s) running {} ready replica(s)",
                    done,
                    snapshot.len(),
                    scale
                )
            }
            (_, None) => format!("{} deployment(s) listed", snapshot.len()),
        }
    }
}

impl WaitObserver for ProgressObserver {
    fn on_start(&self, affected: &AffectedSet, deadline: Duration) {
        print_info(&format!(
            "Waiting up to {}s for {} of {} deployment(s) to be confirmed",
            deadline.as_secs(),
            self.operation,
            affected.len()
        ));
    }

    fn on_poll(
        &self,
        _poll: u32,
        elapsed: Duration,
        snapshot: &[DeploymentDescriptor],
        confirmed: bool,
    ) {
        if !confirmed {
            println!("  [{}] {}", format_elapsed(elapsed), self.summary(snapshot));
        }
    }

    fn on_query_error(&self, poll: u32, error: &ServiceError) {
        print_warning(&format!("Status query {} failed: {}", poll, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_lib::DeploymentStatus;

    fn deployment(ready: u32, api_ok: bool) -> DeploymentDescriptor {
        DeploymentDescriptor {
            model: "income".to_string(),
            version: format!("1.{}", ready),
            image: "registry.local/income".to_string(),
            scale: 3,
            ready_replicas: ready,
            status: DeploymentStatus::Warning,
            model_api_ok: api_ok,
            name: None,
            namespace: None,
            deploy_time: None,
        }
    }

    #[test]
    fn test_scale_summary() {
        let observer = ProgressObserver::new(OperationKind::Scale, Some(3));
        let snapshot = vec![deployment(3, true), deployment(3, false), deployment(1, true)];

        assert_eq!(
            observer.summary(&snapshot),
            "1/3 deployment(s) running 3 ready replica(s)"
        );
    }

    #[test]
    fn test_undeploy_summary() {
        let observer = ProgressObserver::new(OperationKind::Undeploy, None);
        assert_eq!(
            observer.summary(&[deployment(1, true)]),
            "1 deployment(s) still present"
        );
    }
}
