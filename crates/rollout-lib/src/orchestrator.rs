//! Request-and-confirm orchestration
//!
//! Sends one mutation through a [`MutationDispatcher`], captures the affected
//! deployments it reports, and waits on a [`StatusQuery`] until the
//! mutation-specific completion predicate holds.

use crate::error::RolloutError;
use crate::models::{AffectedSet, DeploymentDescriptor};
use crate::predicate::Completion;
use crate::service::{Mutation, MutationDispatcher, OperationKind, StatusQuery};
use crate::wait::{NoopObserver, WaitConfig, WaitLoop, WaitObserver, WaitOutcome, WaitReport};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How a mutation should be confirmed
#[derive(Debug, Clone, Default)]
pub struct RolloutOptions {
    pub wait: WaitConfig,
    /// Skip waiting: one status check, no timeout validation
    pub no_wait: bool,
}

impl RolloutOptions {
    pub fn new(wait: WaitConfig, no_wait: bool) -> Self {
        Self { wait, no_wait }
    }
}

/// Successful result of a mutation
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub operation: OperationKind,
    /// Deployments the service reported as affected by the mutation
    pub affected: Vec<DeploymentDescriptor>,
    pub predicate: Completion,
    pub report: WaitReport,
}

/// Drives a mutation from dispatch to confirmation
pub struct Orchestrator<'a> {
    dispatcher: &'a dyn MutationDispatcher,
    query: &'a dyn StatusQuery,
    observer: &'a dyn WaitObserver,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(dispatcher: &'a dyn MutationDispatcher, query: &'a dyn StatusQuery) -> Self {
        Self {
            dispatcher,
            query,
            observer: &NoopObserver,
            cancel: CancellationToken::new(),
        }
    }

    /// Report wait progress to `observer`
    pub fn observer(mut self, observer: &'a dyn WaitObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Abort the wait once `token` is cancelled
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Dispatch `mutation` and wait for it to be confirmed
    pub async fn execute(
        &self,
        mutation: &Mutation,
        options: &RolloutOptions,
    ) -> Result<Confirmation, RolloutError> {
        let operation = mutation.kind();

        // Reject a bad timeout before anything reaches the service
        if !options.no_wait {
            options.wait.deadline()?;
        }

        info!(operation = %operation, "Sending request");
        let affected = self
            .dispatcher
            .dispatch(mutation)
            .await
            .map_err(|source| RolloutError::DispatchFailed { operation, source })?;
        let affected_set = AffectedSet::from_descriptors(&affected);
        info!(
            operation = %operation,
            affected = affected_set.len(),
            "Server returned list of affected deployments"
        );

        let predicate = if options.no_wait {
            Completion::AlwaysTrue
        } else {
            mutation.completion(affected_set.len())
        };
        debug!(operation = %operation, predicate = %predicate, "Confirming operation");

        let wait = WaitLoop::new(self.query, &predicate, &affected_set, options.wait.clone())
            .observer(self.observer)
            .cancellation(self.cancel.clone());
        let outcome = if options.no_wait {
            wait.check_once().await?
        } else {
            wait.run().await?
        };

        match outcome {
            WaitOutcome::Confirmed(report) => Ok(Confirmation {
                operation,
                affected,
                predicate,
                report,
            }),
            WaitOutcome::TimedOut(report) => Err(RolloutError::TimedOut { operation, report }),
        }
    }
}
