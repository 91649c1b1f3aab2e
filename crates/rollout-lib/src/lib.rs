//! Model rollout library
//!
//! This crate provides the core functionality for:
//! - Dispatching deploy, scale and undeploy requests to the deployment service
//! - Waiting until the affected deployments reach the requested state
//! - Pluggable completion predicates and progress observers
//! - An HTTP client for the deployment service API

pub mod client;
pub mod error;
pub mod filter;
pub mod models;
pub mod observability;
pub mod orchestrator;
pub mod predicate;
pub mod service;
pub mod wait;

pub use client::EdiClient;
pub use error::{RolloutError, ServiceError, WaitError};
pub use filter::filter_affected;
pub use models::*;
pub use observability::TracingObserver;
pub use orchestrator::{Confirmation, Orchestrator, RolloutOptions};
pub use predicate::{Completion, CompletionPredicate};
pub use service::{
    DeployRequest, Mutation, MutationDispatcher, OperationKind, ScaleRequest, StatusQuery,
    UndeployRequest,
};
pub use wait::{
    wait_for, QueryFailurePolicy, WaitConfig, WaitLoop, WaitObserver, WaitOutcome, WaitReport,
};
pub use tokio_util::sync::CancellationToken;
