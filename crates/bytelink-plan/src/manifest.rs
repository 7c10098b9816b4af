//! TOML plan manifests
//!
//! ```toml
//! [[step]]
//! name = "weth9"
//! artifact = "WETH9"
//!
//! [[step]]
//! name = "router"
//! artifact = "SwapRouter"
//! args = [{ address_of = "factory" }, { address_of = "weth9" }]
//!
//! [[step]]
//! name = "descriptor"
//! artifact = "NonfungibleTokenPositionDescriptor"
//! args = [{ address_of = "weth9" }, { bytes32 = "ETH" }]
//!
//! [[step.link]]
//! library = "NFTDescriptor"
//! start = 1681
//! length = 20
//! ```
//!
//! `library = true` publishes a step's address under its artifact name,
//! `library = "Name"` under an explicit name. A `[[step.link]]` table
//! replaces the artifact's own link references.

use crate::error::PlanError;
use crate::plan::DeploymentPlan;
use crate::step::{ArgTemplate, ArgValue, PlanStep};
use bytelink_artifact::{Address, ArtifactSource, LinkReference};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Constructor argument as written in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestArg {
    AddressOf(String),
    Address(Address),
    /// Hex, optional `0x`
    Bytes(String),
    /// Short ASCII label right-padded to 32 bytes
    Bytes32(String),
    Uint(u64),
    Bool(bool),
    String(String),
}

impl ManifestArg {
    fn into_template(self, step: &str) -> Result<ArgTemplate, PlanError> {
        let invalid = |reason: String| PlanError::InvalidArgument {
            step: step.to_string(),
            reason,
        };
        Ok(match self {
            Self::AddressOf(target) => ArgTemplate::AddressOf(target),
            Self::Address(address) => ArgValue::Address(address).into(),
            Self::Bytes(text) => {
                let raw = text.strip_prefix("0x").unwrap_or(&text);
                let bytes = hex::decode(raw).map_err(|e| invalid(format!("bytes {text:?}: {e}")))?;
                ArgValue::FixedBytes(bytes).into()
            }
            Self::Bytes32(label) => ArgValue::bytes32_label(&label)
                .ok_or_else(|| invalid(format!("label {label:?} does not fit in 32 bytes")))?
                .into(),
            Self::Uint(value) => ArgValue::Uint(value).into(),
            Self::Bool(value) => ArgValue::Bool(value).into(),
            Self::String(value) => ArgValue::String(value).into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LibraryFlag {
    Flag(bool),
    Named(String),
}

/// One `[[step]]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestStep {
    pub name: String,
    pub artifact: String,
    #[serde(default)]
    pub args: Vec<ManifestArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryFlag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Vec<LinkReference>>,
}

/// Parsed manifest, not yet bound to artifacts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanManifest {
    #[serde(default, rename = "step")]
    pub steps: Vec<ManifestStep>,
}

impl PlanManifest {
    /// Parse manifest text
    ///
    /// # Errors
    /// Returns [`PlanError::Manifest`] for malformed TOML
    pub fn from_toml_str(text: &str) -> Result<Self, PlanError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a manifest file
    ///
    /// # Errors
    /// Returns [`PlanError::Io`] if the file cannot be read, or
    /// [`PlanError::Manifest`] if it does not parse
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading plan manifest");
        Self::from_toml_str(&text)
    }

    /// Resolve artifact names against `source` and build the plan
    ///
    /// The plan is not validated here; call [`DeploymentPlan::validate`].
    ///
    /// # Errors
    /// Returns [`PlanError::Artifact`] for unknown artifacts,
    /// [`PlanError::InvalidArgument`] for malformed literals and
    /// [`PlanError::DuplicateStep`] for repeated names
    pub fn into_plan(self, source: &dyn ArtifactSource) -> Result<DeploymentPlan, PlanError> {
        let mut plan = DeploymentPlan::new();
        for entry in self.steps {
            let artifact = source.artifact(&entry.artifact)?;
            let args = entry
                .args
                .into_iter()
                .map(|arg| arg.into_template(&entry.name))
                .collect::<Result<Vec<_>, _>>()?;

            let mut step = PlanStep::new(entry.name, artifact).with_args(args);
            if let Some(references) = entry.link {
                step = step.with_link_references(references);
            }
            step = match entry.library {
                Some(LibraryFlag::Flag(true)) => step.as_library(),
                Some(LibraryFlag::Named(name)) => step.as_library_named(name),
                Some(LibraryFlag::Flag(false)) | None => step,
            };
            for dependency in entry.after {
                step = step.after(dependency);
            }
            plan.add_step(step)?;
        }
        Ok(plan)
    }
}
