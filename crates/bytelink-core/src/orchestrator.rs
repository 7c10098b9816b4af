//! Deployment orchestrator
//!
//! Runs the steps of a [`DeploymentPlan`] one at a time, in the plan's
//! deterministic order. For each step it resolves constructor arguments
//! from earlier deployments, links the bytecode against the libraries
//! published so far, and hands the result to the [`DeploymentClient`].
//!
//! # Failure
//!
//! The first failing step aborts the run. Nothing is retried and nothing
//! already deployed is undone; the returned [`DeploymentError`] names the
//! step and carries every artifact deployed before it.

use crate::client::{DeployRequest, DeployedArtifact, DeploymentClient};
use crate::config::DeployerConfig;
use crate::deployment::{Deployment, RunId};
use crate::error::{DeployCause, DeploymentError};
use crate::state::RunState;
use crate::timeout::TimeoutClient;
use bytelink_artifact::{link, AddressMap, Bytecode};
use bytelink_plan::{ArgTemplate, ArgValue, DeploymentPlan, PlanStep};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::Instrument;

/// The deployment orchestrator
///
/// Holds no per-run state, so one instance can run several plans, even
/// concurrently.
pub struct Orchestrator {
    client: Arc<dyn DeploymentClient>,
    config: DeployerConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator deploying through `client`
    ///
    /// The client is only wrapped in a [`TimeoutClient`] if the config
    /// opts into a step timeout.
    #[must_use]
    pub fn new(client: Arc<dyn DeploymentClient>, config: DeployerConfig) -> Self {
        let client: Arc<dyn DeploymentClient> = match config.step_timeout() {
            Some(limit) => Arc::new(TimeoutClient::new(client, limit)),
            None => client,
        };
        Self { client, config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    /// Deploy every step of `plan`
    ///
    /// An empty plan succeeds with an empty [`Deployment`].
    ///
    /// # Errors
    /// Returns [`DeploymentError`] if the plan is rejected or any step fails;
    /// see [`DeploymentError::kind`] for the classification
    pub async fn deploy(&self, plan: &DeploymentPlan) -> Result<Deployment, DeploymentError> {
        let run_id = RunId::new();
        let span = tracing::info_span!("deploy", run_id = %run_id, steps = plan.len());
        self.run(run_id, plan).instrument(span).await
    }

    async fn run(&self, run_id: RunId, plan: &DeploymentPlan) -> Result<Deployment, DeploymentError> {
        let order = self.execution_order(plan).map_err(|e| {
            tracing::error!(error = %e, "plan rejected");
            e
        })?;

        let mut run = Run::default();
        for (index, step) in order.iter().enumerate() {
            if let Err(e) = run.state.advance(RunState::Deploying(index)) {
                return Err(run.abort(step.name(), e));
            }
            match self.deploy_step(step, &run).await {
                Ok((artifact, bytecode)) => {
                    if let Some(library) = step.library() {
                        if let Err(e) = run.libraries.insert(library, artifact.address.clone()) {
                            return Err(run.abort(step.name(), e));
                        }
                    }
                    tracing::info!(
                        step = step.name(),
                        artifact = %artifact.name,
                        address = %artifact.address,
                        "deployed"
                    );
                    run.linked.insert(step.name().to_string(), bytecode);
                    run.deployed.insert(step.name().to_string(), artifact);
                }
                Err(cause) => return Err(run.abort(step.name(), cause)),
            }
        }

        if let Err(e) = run.state.advance(RunState::Succeeded) {
            return Err(DeploymentError::rejected(e));
        }
        tracing::info!(deployed = run.deployed.len(), "run succeeded");
        Ok(Deployment::new(run_id, run.deployed, run.libraries, run.linked))
    }

    fn execution_order<'p>(&self, plan: &'p DeploymentPlan) -> Result<Vec<&'p PlanStep>, DeploymentError> {
        if self.config.validate_before_deploy {
            let validated = plan.validate().map_err(DeploymentError::rejected)?;
            let steps: Vec<&PlanStep> = validated.steps().collect();
            Ok(steps)
        } else {
            plan.resolve_order().map_err(DeploymentError::rejected)
        }
    }

    async fn deploy_step(
        &self,
        step: &PlanStep,
        run: &Run,
    ) -> Result<(DeployedArtifact, Bytecode), DeployCause> {
        let args = step
            .args()
            .iter()
            .map(|arg| run.resolve_arg(arg))
            .collect::<Result<Vec<_>, _>>()?;

        let artifact = step.artifact();
        let bytecode = if step.requires_linking() {
            let linked = link(artifact.bytecode(), step.link_references(), &run.libraries)?;
            tracing::debug!(
                step = step.name(),
                references = step.link_references().len(),
                "linked bytecode"
            );
            linked
        } else {
            artifact.bytecode().clone()
        };

        let request = DeployRequest {
            step: step.name().to_string(),
            artifact: artifact.name().to_string(),
            interface: artifact.interface().clone(),
            bytecode: bytecode.to_bytes()?,
            args,
        };
        let deployed = self.client.deploy_contract(request).await?;
        Ok((deployed, bytecode))
    }
}

/// Deploy `plan` through `client` with the default configuration
///
/// # Errors
/// See [`Orchestrator::deploy`]
pub async fn deploy(
    plan: &DeploymentPlan,
    client: Arc<dyn DeploymentClient>,
) -> Result<Deployment, DeploymentError> {
    Orchestrator::new(client, DeployerConfig::default()).deploy(plan).await
}

/// State owned by one `deploy` call
#[derive(Debug)]
struct Run {
    state: RunState,
    libraries: AddressMap,
    deployed: IndexMap<String, DeployedArtifact>,
    linked: IndexMap<String, Bytecode>,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            state: RunState::NotStarted,
            libraries: AddressMap::new(),
            deployed: IndexMap::new(),
            linked: IndexMap::new(),
        }
    }
}

impl Run {
    fn resolve_arg(&self, arg: &ArgTemplate) -> Result<ArgValue, DeployCause> {
        match arg {
            ArgTemplate::Value(value) => Ok(value.clone()),
            ArgTemplate::AddressOf(step) => self
                .deployed
                .get(step)
                .map(|d| ArgValue::Address(d.address.clone()))
                .ok_or_else(|| DeployCause::MissingAddress(step.clone())),
        }
    }

    fn abort(self, step: &str, cause: impl Into<DeployCause>) -> DeploymentError {
        let mut state = self.state;
        if let Err(e) = state.advance(RunState::Aborted) {
            tracing::warn!(error = %e, "abort from unexpected state");
        }
        let err = DeploymentError::at_step(step, cause, self.deployed);
        tracing::error!(
            step,
            kind = %err.kind(),
            error = %err.cause(),
            deployed = err.deployed().len(),
            "deployment aborted"
        );
        err
    }
}
