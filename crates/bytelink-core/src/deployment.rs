//! Results of a successful run

use crate::client::DeployedArtifact;
use bytelink_artifact::{Address, AddressMap, Bytecode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every artifact of a run, in deployment order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    run_id: RunId,
    artifacts: IndexMap<String, DeployedArtifact>,
    libraries: AddressMap,
    linked: IndexMap<String, Bytecode>,
}

impl Deployment {
    pub(crate) fn new(
        run_id: RunId,
        artifacts: IndexMap<String, DeployedArtifact>,
        libraries: AddressMap,
        linked: IndexMap<String, Bytecode>,
    ) -> Self {
        Self {
            run_id,
            artifacts,
            libraries,
            linked,
        }
    }

    #[inline]
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// `(step, artifact)` pairs in deployment order
    pub fn artifacts(&self) -> impl Iterator<Item = (&str, &DeployedArtifact)> {
        self.artifacts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Step names in deployment order
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    #[must_use]
    pub fn get(&self, step: &str) -> Option<&DeployedArtifact> {
        self.artifacts.get(step)
    }

    #[must_use]
    pub fn address(&self, step: &str) -> Option<&Address> {
        self.get(step).map(|a| &a.address)
    }

    /// Library addresses published during the run
    #[inline]
    #[must_use]
    pub fn libraries(&self) -> &AddressMap {
        &self.libraries
    }

    /// Bytecode exactly as it was sent for `step`
    #[must_use]
    pub fn linked_bytecode(&self, step: &str) -> Option<&Bytecode> {
        self.linked.get(step)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Deployed artifacts in deployment order
    #[must_use]
    pub fn into_artifacts(self) -> Vec<DeployedArtifact> {
        self.artifacts.into_values().collect()
    }
}
