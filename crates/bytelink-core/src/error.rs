//! Error types for deployment runs

use crate::client::{ClientError, DeployedArtifact};
use crate::state::TransitionError;
use bytelink_artifact::{AddressError, BytecodeError, LinkError};
use bytelink_plan::PlanError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Classification of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Link reference out of bounds, zero length or overlapping
    InvalidLinkReference,
    /// Resolved address length differs from the placeholder length
    LinkMismatch,
    /// A referenced step or library cannot be resolved
    UnresolvedDependency,
    /// The client failed to deploy a step
    DeploymentFailure,
    /// The plan is malformed in some other way
    InvalidPlan,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidLinkReference => "invalid link reference",
            Self::LinkMismatch => "link mismatch",
            Self::UnresolvedDependency => "unresolved dependency",
            Self::DeploymentFailure => "deployment failure",
            Self::InvalidPlan => "invalid plan",
        };
        f.write_str(s)
    }
}

/// What went wrong
#[derive(Debug, thiserror::Error)]
pub enum DeployCause {
    /// Plan did not validate
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Linking failed
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Argument refers to a step with no recorded address
    #[error("address of step `{0}` is not available")]
    MissingAddress(String),

    /// Placeholder text remained after linking
    #[error("bytecode is not deployable: {0}")]
    Bytecode(#[from] BytecodeError),

    /// Library address could not be recorded
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Client call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    State(#[from] TransitionError),
}

impl DeployCause {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Plan(PlanError::InvalidLinkReference { source, .. }) => link_kind(source),
            Self::Plan(e) if e.is_unresolved_dependency() => ErrorKind::UnresolvedDependency,
            Self::Plan(_) | Self::Address(_) | Self::State(_) => ErrorKind::InvalidPlan,
            Self::Link(e) => link_kind(e),
            Self::MissingAddress(_) => ErrorKind::UnresolvedDependency,
            Self::Bytecode(_) => ErrorKind::InvalidLinkReference,
            Self::Client(_) => ErrorKind::DeploymentFailure,
        }
    }
}

fn link_kind(error: &LinkError) -> ErrorKind {
    match error {
        LinkError::InvalidLinkReference { .. }
        | LinkError::EmptyBytecode
        | LinkError::UnreferencedPlaceholder { .. } => {
            ErrorKind::InvalidLinkReference
        }
        LinkError::LinkMismatch { .. } => ErrorKind::LinkMismatch,
        LinkError::UnresolvedLibrary(_) => ErrorKind::UnresolvedDependency,
    }
}

/// A run that aborted
///
/// Carries the failing step (none if the plan was rejected before any step
/// ran) and every artifact deployed before the failure, keyed by step name
/// in deployment order.
#[derive(Debug, thiserror::Error)]
#[error("deployment aborted at {}: {cause}", .step.as_deref().unwrap_or("validation"))]
pub struct DeploymentError {
    step: Option<String>,
    #[source]
    cause: DeployCause,
    deployed: IndexMap<String, DeployedArtifact>,
}

impl DeploymentError {
    /// Failure before any step ran
    #[must_use]
    pub fn rejected(cause: impl Into<DeployCause>) -> Self {
        Self {
            step: None,
            cause: cause.into(),
            deployed: IndexMap::new(),
        }
    }

    /// Failure while running `step`
    #[must_use]
    pub fn at_step(
        step: impl Into<String>,
        cause: impl Into<DeployCause>,
        deployed: IndexMap<String, DeployedArtifact>,
    ) -> Self {
        Self {
            step: Some(step.into()),
            cause: cause.into(),
            deployed,
        }
    }

    /// Step that failed
    #[inline]
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        self.step.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn cause(&self) -> &DeployCause {
        &self.cause
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    /// Artifacts deployed before the failure
    #[inline]
    #[must_use]
    pub fn deployed(&self) -> &IndexMap<String, DeployedArtifact> {
        &self.deployed
    }

    /// Check if running the plan again could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(&self.cause, DeployCause::Client(e) if e.is_retryable())
    }

    #[must_use]
    pub fn into_deployed(self) -> IndexMap<String, DeployedArtifact> {
        self.deployed
    }
}
