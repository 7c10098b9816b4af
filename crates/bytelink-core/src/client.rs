//! Deployment client abstraction
//!
//! A [`DeploymentClient`] broadcasts one constructor invocation and waits
//! until the environment confirms it. The signing identity belongs to the
//! client instance; the orchestrator never sees keys.

use bytelink_artifact::{Address, Interface};
use bytelink_plan::ArgValue;
use serde::{Deserialize, Serialize};

/// Everything needed to deploy one artifact
#[derive(Debug, Clone, PartialEq)]
pub struct DeployRequest {
    /// Plan step the request belongs to
    pub step: String,
    /// Artifact name
    pub artifact: String,
    pub interface: Interface,
    /// Fully linked, decoded bytecode
    pub bytecode: Vec<u8>,
    /// Resolved constructor arguments
    pub args: Vec<ArgValue>,
}

/// A confirmed deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedArtifact {
    /// Artifact name
    pub name: String,
    pub address: Address,
    pub interface: Interface,
}

impl DeployedArtifact {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, address: Address, interface: Interface) -> Self {
        Self {
            name: name.into(),
            address,
            interface,
        }
    }
}

/// Errors reported by a deployment client
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Transport to the environment failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Environment refused the deployment
    #[error("deployment rejected: {0}")]
    Rejected(String),

    /// Constructor reverted
    #[error("constructor reverted: {0}")]
    Reverted(String),

    /// No confirmation in time; the broadcast may still land
    #[error("deployment timed out after {secs}s, outcome unknown")]
    Timeout { secs: u64 },
}

impl ClientError {
    /// Check if retrying the same request could succeed
    ///
    /// The orchestrator never retries; this is for callers deciding whether
    /// to run the plan again. A timeout is not retryable: the contract may
    /// already exist, and sending again could deploy it twice.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if the deployment may have happened despite the error
    #[inline]
    #[must_use]
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Broadcasts deployments and awaits confirmation
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DeploymentClient: Send + Sync {
    /// Deploy one artifact and wait for its address
    async fn deploy_contract(&self, request: DeployRequest) -> Result<DeployedArtifact, ClientError>;
}

#[async_trait::async_trait]
impl<C: DeploymentClient + ?Sized> DeploymentClient for std::sync::Arc<C> {
    async fn deploy_contract(&self, request: DeployRequest) -> Result<DeployedArtifact, ClientError> {
        (**self).deploy_contract(request).await
    }
}
