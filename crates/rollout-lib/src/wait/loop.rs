//! Wait loop state machine
//!
//! Each iteration is one call to [`WaitLoop::step`], which moves the loop from
//! `Polling` to one of the terminal states or leaves it polling. Time comes
//! from `tokio::time`, so a paused runtime acts as a fake clock in tests.

use super::{NoopObserver, QueryFailurePolicy, WaitConfig, WaitObserver, WaitOutcome, WaitReport};
use crate::error::{ServiceError, WaitError};
use crate::filter::filter_affected;
use crate::models::{AffectedSet, DeploymentDescriptor};
use crate::predicate::CompletionPredicate;
use crate::service::StatusQuery;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// States of the wait loop
#[derive(Debug)]
enum WaitState {
    Polling,
    Confirmed,
    TimedOut,
    Failed(WaitError),
}

/// Result of a single query/filter/evaluate pass
enum PollResult {
    Evaluated(bool),
    QueryFailed(ServiceError),
    Cancelled,
}

/// Loop-local bookkeeping
struct Progress {
    start: Instant,
    polls: u32,
    last_snapshot: Vec<DeploymentDescriptor>,
    last_error: Option<String>,
}

impl Progress {
    fn start() -> Self {
        Self {
            start: Instant::now(),
            polls: 0,
            last_snapshot: Vec::new(),
            last_error: None,
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn report(self) -> WaitReport {
        WaitReport {
            elapsed: self.start.elapsed(),
            polls: self.polls,
            last_snapshot: self.last_snapshot,
            last_error: self.last_error,
        }
    }
}

/// Polls the status source until the predicate confirms or the deadline passes
pub struct WaitLoop<'a> {
    query: &'a dyn StatusQuery,
    predicate: &'a dyn CompletionPredicate,
    affected: &'a AffectedSet,
    config: WaitConfig,
    observer: &'a dyn WaitObserver,
    cancel: CancellationToken,
}

impl<'a> WaitLoop<'a> {
    /// Create a wait loop with no observer and a token nobody cancels
    pub fn new(
        query: &'a dyn StatusQuery,
        predicate: &'a dyn CompletionPredicate,
        affected: &'a AffectedSet,
        config: WaitConfig,
    ) -> Self {
        Self {
            query,
            predicate,
            affected,
            config,
            observer: &NoopObserver,
            cancel: CancellationToken::new(),
        }
    }

    /// Report progress to `observer`
    pub fn observer(mut self, observer: &'a dyn WaitObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Stop waiting once `token` is cancelled
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run until confirmed, timed out, cancelled or (under
    /// [`QueryFailurePolicy::Abort`]) a query fails
    pub async fn run(self) -> Result<WaitOutcome, WaitError> {
        let deadline = match self.config.deadline() {
            Ok(deadline) => deadline,
            Err(e) => {
                self.observer.on_failed(&e);
                return Err(e);
            }
        };

        debug!(
            timeout_secs = deadline.as_secs(),
            affected = self.affected.len(),
            "Starting checking cycle"
        );
        self.observer.on_start(self.affected, deadline);

        let mut progress = Progress::start();
        loop {
            match self.step(&mut progress, deadline).await {
                WaitState::Polling => self.pause().await,
                WaitState::Confirmed => {
                    info!(polls = progress.polls, "Completion of the operation confirmed");
                    return Ok(self.finish(WaitOutcome::Confirmed(progress.report())));
                }
                WaitState::TimedOut => {
                    info!(polls = progress.polls, "Operation has not been confirmed in time");
                    return Ok(self.finish(WaitOutcome::TimedOut(progress.report())));
                }
                WaitState::Failed(e) => {
                    self.observer.on_failed(&e);
                    return Err(e);
                }
            }
        }
    }

    /// One status check without a deadline, for callers that do not wait
    ///
    /// Confirmed when the predicate holds on that single snapshot, TimedOut
    /// otherwise. Query failures are always returned as errors.
    pub async fn check_once(self) -> Result<WaitOutcome, WaitError> {
        let mut progress = Progress::start();
        let outcome = match self.poll(&mut progress).await {
            PollResult::Evaluated(true) => WaitOutcome::Confirmed(progress.report()),
            PollResult::Evaluated(false) => WaitOutcome::TimedOut(progress.report()),
            PollResult::QueryFailed(source) => {
                let e = WaitError::QueryFailed {
                    polls: progress.polls,
                    elapsed: progress.elapsed(),
                    source,
                };
                self.observer.on_failed(&e);
                return Err(e);
            }
            PollResult::Cancelled => {
                let e = cancelled(&progress);
                self.observer.on_failed(&e);
                return Err(e);
            }
        };
        Ok(self.finish(outcome))
    }

    /// Transition function: one iteration of the loop
    async fn step(&self, progress: &mut Progress, deadline: Duration) -> WaitState {
        if self.cancel.is_cancelled() {
            return WaitState::Failed(cancelled(progress));
        }

        let elapsed = progress.elapsed();
        if elapsed > deadline {
            return WaitState::TimedOut;
        }

        match self.poll(progress).await {
            PollResult::Evaluated(true) => WaitState::Confirmed,
            PollResult::Evaluated(false) => WaitState::Polling,
            PollResult::Cancelled => WaitState::Failed(cancelled(progress)),
            PollResult::QueryFailed(source) => match self.config.on_query_error {
                QueryFailurePolicy::Abort => WaitState::Failed(WaitError::QueryFailed {
                    polls: progress.polls,
                    elapsed: progress.elapsed(),
                    source,
                }),
                QueryFailurePolicy::Tolerate => {
                    progress.last_error = Some(source.to_string());
                    WaitState::Polling
                }
            },
        }
    }

    /// Query, narrow to the affected set and evaluate the predicate
    async fn poll(&self, progress: &mut Progress) -> PollResult {
        progress.polls += 1;
        debug!(poll = progress.polls, "Requesting actual status of affected deployments");

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return PollResult::Cancelled,
            result = self.query.query() => result,
        };

        match result {
            Ok(snapshot) => {
                let filtered = filter_affected(snapshot, self.affected);
                let confirmed = self.predicate.evaluate(&filtered);
                debug!(
                    poll = progress.polls,
                    matched = filtered.len(),
                    confirmed,
                    "Evaluated affected deployment statuses"
                );
                self.observer
                    .on_poll(progress.polls, progress.elapsed(), &filtered, confirmed);
                progress.last_snapshot = filtered;
                PollResult::Evaluated(confirmed)
            }
            Err(e) => {
                debug!(poll = progress.polls, error = %e, "Status query failed");
                self.observer.on_query_error(progress.polls, &e);
                PollResult::QueryFailed(e)
            }
        }
    }

    /// Sleep one poll interval unless cancelled first
    async fn pause(&self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.poll_interval) => {}
        }
    }

    fn finish(&self, outcome: WaitOutcome) -> WaitOutcome {
        self.observer.on_finish(&outcome);
        outcome
    }
}

fn cancelled(progress: &Progress) -> WaitError {
    WaitError::Cancelled {
        polls: progress.polls,
        elapsed: progress.elapsed(),
    }
}

/// Wait for `predicate` over the `affected` deployments with a plain timeout
pub async fn wait_for(
    query: &dyn StatusQuery,
    affected: &AffectedSet,
    predicate: &dyn CompletionPredicate,
    timeout_secs: i64,
) -> Result<WaitOutcome, WaitError> {
    WaitLoop::new(query, predicate, affected, WaitConfig::new(timeout_secs))
        .run()
        .await
}
