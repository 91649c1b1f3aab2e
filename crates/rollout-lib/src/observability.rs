//! Structured logging of wait progress with tracing

use crate::error::{ServiceError, WaitError};
use crate::models::{AffectedSet, DeploymentDescriptor};
use crate::wait::{WaitObserver, WaitOutcome};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Wait observer that emits one tracing event per progress step
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

impl WaitObserver for TracingObserver {
    fn on_start(&self, affected: &AffectedSet, deadline: Duration) {
        let mut keys: Vec<String> = affected.iter().map(ToString::to_string).collect();
        keys.sort();
        info!(
            event = "wait_started",
            operation = %self.operation,
            timeout_secs = deadline.as_secs(),
            affected = ?keys,
            "Waiting for operation to be confirmed"
        );
    }

    fn on_poll(
        &self,
        poll: u32,
        elapsed: Duration,
        snapshot: &[DeploymentDescriptor],
        confirmed: bool,
    ) {
        let ready: Vec<String> = snapshot
            .iter()
            .map(|d| format!("{}={}/{}", d.key(), d.ready_replicas, d.scale))
            .collect();
        debug!(
            event = "wait_poll",
            operation = %self.operation,
            poll,
            elapsed_ms = elapsed.as_millis() as u64,
            matched = snapshot.len(),
            ready = ?ready,
            confirmed,
            "Server returned actual status of affected deployments"
        );
    }

    fn on_query_error(&self, poll: u32, error: &ServiceError) {
        warn!(
            event = "wait_query_failed",
            operation = %self.operation,
            poll,
            error = %error,
            "Status query failed"
        );
    }

    fn on_finish(&self, outcome: &WaitOutcome) {
        let report = outcome.report();
        let message = if outcome.is_confirmed() {
            "Operation confirmed"
        } else {
            "Operation not confirmed before the deadline"
        };
        info!(
            event = "wait_finished",
            operation = %self.operation,
            confirmed = outcome.is_confirmed(),
            polls = report.polls,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "{}",
            message
        );
    }

    fn on_failed(&self, error: &WaitError) {
        warn!(
            event = "wait_failed",
            operation = %self.operation,
            error = %error,
            "Wait ended with an error"
        );
    }
}
