//! Management service boundary
//!
//! The orchestrator talks to the remote service through two narrow traits:
//! [`MutationDispatcher`] issues the change request and [`StatusQuery`]
//! reads back the live deployment listing. [`crate::client::EdiClient`]
//! implements both over HTTP; tests substitute in-memory fakes.

use crate::error::ServiceError;
use crate::models::DeploymentDescriptor;
use crate::predicate::Completion;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of mutation sent to the management service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Deploy,
    Scale,
    Undeploy,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deploy => "deploy",
            OperationKind::Scale => "scale",
            OperationKind::Undeploy => "undeploy",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deploy a model image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_iam_role: Option<String>,
    pub scale: u32,
    /// Startup timeout for the liveness probe, seconds
    pub liveness_timeout: u32,
    /// Startup timeout for the readiness probe, seconds
    pub readiness_timeout: u32,
}

/// Change the replica count of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleRequest {
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub scale: u32,
}

/// Remove a model deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndeployRequest {
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// Removal grace period, seconds
    pub grace_period: u32,
    pub ignore_not_found: bool,
}

/// A change request together with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Deploy(DeployRequest),
    Scale(ScaleRequest),
    Undeploy(UndeployRequest),
}

impl Mutation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Mutation::Deploy(_) => OperationKind::Deploy,
            Mutation::Scale(_) => OperationKind::Scale,
            Mutation::Undeploy(_) => OperationKind::Undeploy,
        }
    }

    /// Completion check for this mutation given how many distinct
    /// deployments the service reported as affected
    pub fn completion(&self, affected_count: usize) -> Completion {
        match self {
            Mutation::Deploy(req) => Completion::scale(req.scale, affected_count),
            Mutation::Scale(req) => Completion::scale(req.scale, affected_count),
            Mutation::Undeploy(_) => Completion::UndeployConfirmed,
        }
    }
}

/// Reads the current deployment listing from the management service
#[async_trait]
pub trait StatusQuery: Send + Sync {
    /// Full listing of deployments known to the service
    async fn query(&self) -> Result<Vec<DeploymentDescriptor>, ServiceError>;
}

/// Sends a mutation to the management service
#[async_trait]
pub trait MutationDispatcher: Send + Sync {
    /// Issue exactly one request; returns the deployments the service will affect
    async fn dispatch(&self, mutation: &Mutation) -> Result<Vec<DeploymentDescriptor>, ServiceError>;
}
