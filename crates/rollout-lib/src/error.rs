//! Error types for the rollout library

use crate::service::OperationKind;
use crate::wait::WaitReport;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to the management service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("authentication rejected ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport failure raised by a non-HTTP status source
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the wait loop itself, other than running out of time
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("invalid timeout {0}s: should be a positive number of seconds")]
    InvalidTimeout(i64),

    #[error("status query failed on poll {polls} after {elapsed:?}")]
    QueryFailed {
        polls: u32,
        elapsed: Duration,
        #[source]
        source: ServiceError,
    },

    #[error("wait cancelled after {polls} poll(s) and {elapsed:?}")]
    Cancelled { polls: u32, elapsed: Duration },
}

/// Terminal failure of a request-and-confirm operation
#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("{operation} request was not accepted")]
    DispatchFailed {
        operation: OperationKind,
        #[source]
        source: ServiceError,
    },

    #[error("time out: {operation} has not been confirmed after {:?} ({} poll(s))", .report.elapsed, .report.polls)]
    TimedOut {
        operation: OperationKind,
        report: WaitReport,
    },

    #[error(transparent)]
    Wait(#[from] WaitError),
}

impl RolloutError {
    /// Whether the operator should follow up by inspecting the deployments
    pub fn needs_inspection(&self) -> bool {
        matches!(
            self,
            RolloutError::TimedOut { .. }
                | RolloutError::Wait(WaitError::QueryFailed { .. })
                | RolloutError::Wait(WaitError::Cancelled { .. })
        )
    }
}
