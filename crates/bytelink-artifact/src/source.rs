//! Artifact sources
//!
//! Deployment plans take their artifact definitions from an
//! [`ArtifactSource`] passed in by the caller, so tests can substitute fake
//! artifacts for compiled ones.
//!
//! [`ArtifactStore`] is the in-memory implementation. It can be filled from
//! compiler output on disk: Hardhat artifacts (`bytecode` as a string next to
//! `linkReferences`) and Foundry artifacts (`bytecode.object` with nested
//! `linkReferences`) are both understood.

use crate::artifact::{ArtifactDefinition, ArtifactError, Interface};
use crate::bytecode::Bytecode;
use crate::link::LinkReference;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Provider of artifact definitions by name
pub trait ArtifactSource {
    /// Look up a definition
    ///
    /// # Errors
    /// Returns [`ArtifactError::NotFound`] if no artifact has this name
    fn artifact(&self, name: &str) -> Result<ArtifactDefinition, ArtifactError>;
}

/// In-memory artifact table
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    artifacts: BTreeMap<String, ArtifactDefinition>,
}

impl ArtifactStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition under its own name
    ///
    /// # Errors
    /// Returns [`ArtifactError::Duplicate`] if the name is taken
    pub fn insert(&mut self, definition: ArtifactDefinition) -> Result<(), ArtifactError> {
        let name = definition.name().to_string();
        if self.artifacts.contains_key(&name) {
            return Err(ArtifactError::Duplicate(name));
        }
        self.artifacts.insert(name, definition);
        Ok(())
    }

    /// Builder form of [`ArtifactStore::insert`]
    ///
    /// # Errors
    /// Returns [`ArtifactError::Duplicate`] if the name is taken
    pub fn with(mut self, definition: ArtifactDefinition) -> Result<Self, ArtifactError> {
        self.insert(definition)?;
        Ok(self)
    }

    /// Artifact names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
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

    /// Load every artifact JSON file under `dir`, recursively
    ///
    /// Hardhat debug files (`*.dbg.json`) and JSON files without a
    /// `bytecode` field (build info, metadata) are skipped.
    ///
    /// # Errors
    /// Returns error on unreadable files, malformed artifacts, or two
    /// artifacts with the same contract name.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let files = collect_json_files(dir.as_ref())?;

        let mut store = Self::new();
        for path in files {
            let text = fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
            let value: serde_json::Value =
                serde_json::from_str(&text).map_err(|source| ArtifactError::Json {
                    path: path.clone(),
                    source,
                })?;
            if value.get("bytecode").is_none() {
                tracing::debug!(path = %path.display(), "skipping non-artifact json");
                continue;
            }

            let fallback = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let definition = parse_compiler_artifact(&fallback, value).map_err(|e| match e {
                ArtifactError::Json { source, .. } => ArtifactError::Json {
                    path: path.clone(),
                    source,
                },
                other => other,
            })?;
            tracing::debug!(
                name = definition.name(),
                path = %path.display(),
                link_references = definition.link_references().len(),
                "loaded artifact"
            );
            store.insert(definition)?;
        }
        Ok(store)
    }
}

impl ArtifactSource for ArtifactStore {
    fn artifact(&self, name: &str) -> Result<ArtifactDefinition, ArtifactError> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(name.to_string()))
    }
}

fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| ArtifactError::Io {
            path: err.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            source: err.into(),
        })?;
        if entry.file_type().is_file() && is_artifact_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_artifact_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".json") && !name.ends_with(".dbg.json")
}

/// `file -> library -> [{start, length}]`
type RawLinkReferences = BTreeMap<String, BTreeMap<String, Vec<RawOffset>>>;

#[derive(Debug, Deserialize)]
struct RawOffset {
    start: usize,
    length: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Text(String),
    Object {
        object: String,
        #[serde(default, rename = "linkReferences")]
        link_references: RawLinkReferences,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    #[serde(default)]
    abi: serde_json::Value,
    bytecode: RawBytecode,
    #[serde(default)]
    link_references: RawLinkReferences,
}

/// Parse one compiler artifact
///
/// The name comes from `contractName` when present, else `fallback_name`.
///
/// # Errors
/// Returns error if the JSON does not have the artifact shape or the
/// bytecode is malformed
pub fn parse_compiler_artifact(
    fallback_name: &str,
    value: serde_json::Value,
) -> Result<ArtifactDefinition, ArtifactError> {
    let raw: RawArtifact = serde_json::from_value(value).map_err(|source| ArtifactError::Json {
        path: PathBuf::from(fallback_name),
        source,
    })?;

    let name = raw
        .contract_name
        .unwrap_or_else(|| fallback_name.to_string());

    let (text, mut raw_refs) = match raw.bytecode {
        RawBytecode::Text(text) => (text, BTreeMap::new()),
        RawBytecode::Object {
            object,
            link_references,
        } => (object, link_references),
    };
    for (file, libraries) in raw.link_references {
        let merged = raw_refs.entry(file).or_default();
        for (library, offsets) in libraries {
            merged.entry(library).or_default().extend(offsets);
        }
    }

    let bytecode = Bytecode::parse(&text).map_err(|source| ArtifactError::Bytecode {
        name: name.clone(),
        source,
    })?;

    let references = raw_refs
        .into_iter()
        .flat_map(|(file, libraries)| {
            libraries.into_iter().flat_map(move |(library, offsets)| {
                let file = file.clone();
                offsets.into_iter().map(move |o| {
                    LinkReference::new(library.clone(), o.start, o.length).with_source(file.clone())
                })
            })
        })
        .collect();

    Ok(ArtifactDefinition::new(name, Interface::new(raw.abi), bytecode)
        .with_link_references(references))
}
