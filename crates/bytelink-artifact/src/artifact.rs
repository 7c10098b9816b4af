//! Artifact definitions
//!
//! An [`ArtifactDefinition`] is the immutable description of one deployable
//! binary: its interface, its (possibly unlinked) bytecode and the link
//! references that must be patched before it can be deployed.

use crate::address::AddressMap;
use crate::bytecode::{Bytecode, BytecodeError};
use crate::link::{self, LinkError, LinkReference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Interface descriptor (ABI JSON)
///
/// Opaque to the linker and orchestrator; passed through to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interface(serde_json::Value);

impl Interface {
    #[inline]
    #[must_use]
    pub fn new(abi: serde_json::Value) -> Self {
        Self(abi)
    }

    /// Interface with no entries
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(serde_json::Value::Array(Vec::new()))
    }

    #[inline]
    #[must_use]
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Number of ABI entries, zero if the descriptor is not a list
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.0.as_array().map_or(0, Vec::len)
    }
}

/// One deployable binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDefinition {
    name: String,
    interface: Interface,
    bytecode: Bytecode,
    #[serde(default)]
    link_references: Vec<LinkReference>,
}

impl ArtifactDefinition {
    /// Create a definition with no link references
    #[must_use]
    pub fn new(name: impl Into<String>, interface: Interface, bytecode: Bytecode) -> Self {
        Self {
            name: name.into(),
            interface,
            bytecode,
            link_references: Vec::new(),
        }
    }

    /// With link references
    #[inline]
    #[must_use]
    pub fn with_link_references(mut self, references: Vec<LinkReference>) -> Self {
        self.link_references = references;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Unlinked bytecode
    #[inline]
    #[must_use]
    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    #[inline]
    #[must_use]
    pub fn link_references(&self) -> &[LinkReference] {
        &self.link_references
    }

    /// Check if any placeholder needs patching
    #[inline]
    #[must_use]
    pub fn requires_linking(&self) -> bool {
        !self.link_references.is_empty()
    }

    /// Distinct library names referenced, sorted
    #[must_use]
    pub fn libraries(&self) -> BTreeSet<&str> {
        self.link_references
            .iter()
            .map(|r| r.library.as_str())
            .collect()
    }

    /// Check link references against the bytecode
    ///
    /// # Errors
    /// See [`link::validate_references`]
    pub fn validate(&self) -> Result<(), LinkError> {
        link::validate_references(&self.bytecode, &self.link_references)
    }

    /// Link against resolved addresses
    ///
    /// # Errors
    /// See [`link::link`]
    pub fn link(&self, resolved: &AddressMap) -> Result<Bytecode, LinkError> {
        link::link(&self.bytecode, &self.link_references, resolved)
    }
}

/// Artifact loading errors
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// No artifact with this name
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Two artifacts share a name
    #[error("duplicate artifact: {0}")]
    Duplicate(String),

    /// Reading an artifact file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact file is not valid JSON of the expected shape
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Bytecode field is malformed
    #[error("invalid bytecode in artifact {name}: {source}")]
    Bytecode {
        name: String,
        #[source]
        source: BytecodeError,
    },
}
