//! Timeout decorator for deployment clients

use crate::client::{ClientError, DeployRequest, DeployedArtifact, DeploymentClient};
use std::time::Duration;

/// Fails a deployment with [`ClientError::Timeout`] if the inner client does
/// not confirm within `limit`
///
/// The inner call is dropped on timeout; whether the broadcast still lands
/// is up to the environment.
#[derive(Debug, Clone)]
pub struct TimeoutClient<C> {
    inner: C,
    limit: Duration,
}

impl<C> TimeoutClient<C> {
    #[inline]
    #[must_use]
    pub fn new(inner: C, limit: Duration) -> Self {
        Self { inner, limit }
    }

    #[inline]
    #[must_use]
    pub fn limit(&self) -> Duration {
        self.limit
    }

    #[inline]
    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait::async_trait]
impl<C: DeploymentClient> DeploymentClient for TimeoutClient<C> {
    async fn deploy_contract(&self, request: DeployRequest) -> Result<DeployedArtifact, ClientError> {
        let step = request.step.clone();
        match tokio::time::timeout(self.limit, self.inner.deploy_contract(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(step = %step, limit = ?self.limit, "deployment timed out");
                Err(ClientError::Timeout {
                    secs: self.limit.as_secs(),
                })
            }
        }
    }
}
