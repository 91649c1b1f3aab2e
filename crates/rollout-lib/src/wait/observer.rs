//! Progress callbacks for the wait loop

use super::WaitOutcome;
use crate::error::{ServiceError, WaitError};
use crate::models::{AffectedSet, DeploymentDescriptor};
use std::time::Duration;

/// Receives progress events from a [`super::WaitLoop`]
///
/// All methods default to doing nothing.
pub trait WaitObserver: Send + Sync {
    /// Called once before the first status query
    fn on_start(&self, _affected: &AffectedSet, _deadline: Duration) {}

    /// Called after each successful query with the filtered snapshot
    fn on_poll(
        &self,
        _poll: u32,
        _elapsed: Duration,
        _snapshot: &[DeploymentDescriptor],
        _confirmed: bool,
    ) {
    }

    /// Called when a status query fails
    fn on_query_error(&self, _poll: u32, _error: &ServiceError) {}

    /// Called once when the wait ends with an outcome
    fn on_finish(&self, _outcome: &WaitOutcome) {}

    /// Called once when the wait ends with an error
    fn on_failed(&self, _error: &WaitError) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl WaitObserver for NoopObserver {}

impl<A: WaitObserver, B: WaitObserver> WaitObserver for (A, B) {
    fn on_start(&self, affected: &AffectedSet, deadline: Duration) {
        self.0.on_start(affected, deadline);
        self.1.on_start(affected, deadline);
    }

    fn on_poll(
        &self,
        poll: u32,
        elapsed: Duration,
        snapshot: &[DeploymentDescriptor],
        confirmed: bool,
    ) {
        self.0.on_poll(poll, elapsed, snapshot, confirmed);
        self.1.on_poll(poll, elapsed, snapshot, confirmed);
    }

    fn on_query_error(&self, poll: u32, error: &ServiceError) {
        self.0.on_query_error(poll, error);
        self.1.on_query_error(poll, error);
    }

    fn on_finish(&self, outcome: &WaitOutcome) {
        self.0.on_finish(outcome);
        self.1.on_finish(outcome);
    }

    fn on_failed(&self, error: &WaitError) {
        self.0.on_failed(error);
        self.1.on_failed(error);
    }
}
