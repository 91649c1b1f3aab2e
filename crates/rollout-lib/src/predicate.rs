//! Completion predicates
//!
//! A predicate decides, from the filtered status snapshot of the affected
//! deployments, whether a mutation has taken effect. The wait loop only ever
//! sees the [`CompletionPredicate`] trait, so each operation kind plugs in its
//! own definition of "done".

use crate::models::DeploymentDescriptor;
use std::fmt;

/// Decides whether an operation is complete
pub trait CompletionPredicate: Send + Sync {
    /// Evaluate a filtered snapshot; must not depend on descriptor order
    fn evaluate(&self, snapshot: &[DeploymentDescriptor]) -> bool;
}

/// Built-in completion checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Exactly `expected_count` deployments run `expected_scale` ready replicas
    /// and answer on their model API
    ScaleConfirmed {
        expected_scale: u32,
        expected_count: usize,
    },
    /// None of the affected deployments is listed any more
    UndeployConfirmed,
    /// No confirmation; used when waiting is disabled
    AlwaysTrue,
}

impl Completion {
    pub fn scale(expected_scale: u32, expected_count: usize) -> Self {
        Completion::ScaleConfirmed {
            expected_scale,
            expected_count,
        }
    }
}

impl CompletionPredicate for Completion {
    fn evaluate(&self, snapshot: &[DeploymentDescriptor]) -> bool {
        match *self {
            Completion::ScaleConfirmed {
                expected_scale,
                expected_count,
            } => {
                // Replica count alone is not enough: the pods can be ready
                // while the model API inside them is still starting.
                let finished = snapshot
                    .iter()
                    .filter(|d| d.ready_replicas == expected_scale && d.model_api_ok)
                    .count();
                finished == expected_count
            }
            Completion::UndeployConfirmed => snapshot.is_empty(),
            Completion::AlwaysTrue => true,
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::ScaleConfirmed {
                expected_scale,
                expected_count,
            } => write!(
                f,
                "{} deployment(s) with {} ready replica(s)",
                expected_count, expected_scale
            ),
            Completion::UndeployConfirmed => f.write_str("all affected deployments removed"),
            Completion::AlwaysTrue => f.write_str("no confirmation"),
        }
    }
}

impl<F> CompletionPredicate for F
where
    F: Fn(&[DeploymentDescriptor]) -> bool + Send + Sync,
{
    fn evaluate(&self, snapshot: &[DeploymentDescriptor]) -> bool {
        self(snapshot)
    }
}
