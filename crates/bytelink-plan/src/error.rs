//! Error types for deployment plans

use bytelink_artifact::{ArtifactError, LinkError};
use std::path::PathBuf;

/// Plan construction and validation errors
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Two steps share a name
    #[error("duplicate step name: {0}")]
    DuplicateStep(String),

    /// Two steps publish the same library name
    #[error("library `{library}` is provided by both `{first}` and `{second}`")]
    DuplicateLibrary {
        library: String,
        first: String,
        second: String,
    },

    /// Step has nothing to deploy
    #[error("step `{0}` has empty bytecode")]
    EmptyBytecode(String),

    /// Argument or ordering edge names a step that is not in the plan
    #[error("step `{step}` depends on unknown step `{dependency}`")]
    UnknownDependency { step: String, dependency: String },

    /// Link reference names a library no step provides
    #[error("step `{step}` links library `{library}` which no step provides")]
    UnknownLibrary { step: String, library: String },

    /// Step depends on itself
    #[error("step `{0}` depends on itself")]
    SelfDependency(String),

    /// Dependencies form a cycle
    #[error("dependency cycle between steps {steps:?}")]
    CycleDetected { steps: Vec<String> },

    /// Link references of a step are malformed
    #[error("step `{step}`: {source}")]
    InvalidLinkReference {
        step: String,
        #[source]
        source: LinkError,
    },

    /// Constructor argument could not be built
    #[error("step `{step}`: invalid argument: {reason}")]
    InvalidArgument { step: String, reason: String },

    /// Artifact lookup failed
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Reading a manifest failed
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid TOML of the expected shape
    #[error("invalid manifest: {0}")]
    Manifest(#[from] toml::de::Error),
}

impl PlanError {
    /// Check if the error means a dependency cannot be resolved
    #[inline]
    #[must_use]
    pub fn is_unresolved_dependency(&self) -> bool {
        matches!(
            self,
            Self::UnknownDependency { .. }
                | Self::UnknownLibrary { .. }
                | Self::SelfDependency(_)
                | Self::CycleDetected { .. }
        )
    }

    /// Name of the step the error is about, if any
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::DuplicateStep(step)
            | Self::EmptyBytecode(step)
            | Self::SelfDependency(step)
            | Self::UnknownDependency { step, .. }
            | Self::UnknownLibrary { step, .. }
            | Self::InvalidLinkReference { step, .. }
            | Self::InvalidArgument { step, .. } => Some(step),
            Self::DuplicateLibrary { second, .. } => Some(second),
            Self::CycleDetected { steps } => steps.first().map(String::as_str),
            Self::Artifact(_) | Self::Io { .. } | Self::Manifest(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_error_display() {
        let err = PlanError::UnknownLibrary {
            step: "descriptor".into(),
            library: "NFTDescriptor".into(),
        };
        assert!(err.to_string().contains("NFTDescriptor"));
        assert!(err.is_unresolved_dependency());
        assert_eq!(err.step(), Some("descriptor"));
    }

    #[test]
    fn duplicate_is_not_unresolved() {
        let err = PlanError::DuplicateStep("a".into());
        assert!(!err.is_unresolved_dependency());
    }
}
