//! Waiting for a mutation to take effect
//!
//! This module provides:
//! - [`WaitLoop`], a deadline-bounded poll/filter/evaluate cycle
//! - [`WaitObserver`] for progress reporting without global state
//! - [`WaitConfig`] and the transient query failure policy

mod r#loop;
mod observer;


pub use observer::{NoopObserver, WaitObserver};
pub use r#loop::{wait_for, WaitLoop};

use crate::error::WaitError;
use crate::models::DeploymentDescriptor;
use std::time::Duration;

/// Default operator-facing timeout, seconds
pub const DEFAULT_TIMEOUT_SECS: i64 = 300;

/// Default pause between two status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What to do when a single status query fails mid-wait
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryFailurePolicy {
    /// Count the poll as unconfirmed and keep polling until the deadline
    #[default]
    Tolerate,
    /// End the wait with [`WaitError::QueryFailed`]
    Abort,
}

/// Configuration for the wait loop
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Wall-clock budget in seconds; must be positive
    pub timeout_secs: i64,
    /// Pause between status queries (default: 1 second)
    pub poll_interval: Duration,
    /// Handling of transient status query failures
    pub on_query_error: QueryFailurePolicy,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            on_query_error: QueryFailurePolicy::default(),
        }
    }
}

impl WaitConfig {
    pub fn new(timeout_secs: i64) -> Self {
        Self {
            timeout_secs,
            ..Self::default()
        }
    }

    /// Set the pause between status queries
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the transient query failure policy
    pub fn on_query_error(mut self, policy: QueryFailurePolicy) -> Self {
        self.on_query_error = policy;
        self
    }

    /// Validated deadline
    pub fn deadline(&self) -> Result<Duration, WaitError> {
        if self.timeout_secs <= 0 {
            return Err(WaitError::InvalidTimeout(self.timeout_secs));
        }
        Ok(Duration::from_secs(self.timeout_secs as u64))
    }
}

/// Diagnostics gathered while waiting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaitReport {
    pub elapsed: Duration,
    pub polls: u32,
    /// Filtered snapshot from the last successful query
    pub last_snapshot: Vec<DeploymentDescriptor>,
    /// Most recent tolerated query failure
    pub last_error: Option<String>,
}

/// Terminal result of a wait
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Confirmed(WaitReport),
    TimedOut(WaitReport),
}

impl WaitOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, WaitOutcome::Confirmed(_))
    }

    pub fn report(&self) -> &WaitReport {
        match self {
            WaitOutcome::Confirmed(report) | WaitOutcome::TimedOut(report) => report,
        }
    }

    pub fn into_report(self) -> WaitReport {
        match self {
            WaitOutcome::Confirmed(report) | WaitOutcome::TimedOut(report) => report,
        }
    }
}
