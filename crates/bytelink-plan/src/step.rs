//! Plan steps and constructor arguments

use bytelink_artifact::{Address, ArtifactDefinition, LinkReference};
use serde::{Deserialize, Serialize};

/// A resolved constructor argument, ready to hand to a deployment client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Address(Address),
    /// Fixed-size byte string (`bytesN`)
    FixedBytes(#[serde(with = "hex_bytes")] Vec<u8>),
    Uint(u64),
    Bool(bool),
    String(String),
}

impl ArgValue {
    /// Right-padded `bytes32` holding a short ASCII label, e.g. a native
    /// currency symbol
    ///
    /// Returns `None` if the label is longer than 32 bytes.
    #[must_use]
    pub fn bytes32_label(label: &str) -> Option<Self> {
        let raw = label.as_bytes();
        if raw.len() > 32 {
            return None;
        }
        let mut word = vec![0u8; 32];
        word[..raw.len()].copy_from_slice(raw);
        Some(Self::FixedBytes(word))
    }
}

impl std::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address(a) => write!(f, "{a}"),
            Self::FixedBytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        hex::decode(text.strip_prefix("0x").unwrap_or(&text)).map_err(serde::de::Error::custom)
    }
}

/// Constructor argument as declared in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgTemplate {
    /// Fixed value
    Value(ArgValue),
    /// Deployed address of an earlier step
    AddressOf(String),
}

impl ArgTemplate {
    /// Address of the named step
    #[inline]
    #[must_use]
    pub fn address_of(step: impl Into<String>) -> Self {
        Self::AddressOf(step.into())
    }

    /// Step this argument depends on, if any
    #[inline]
    #[must_use]
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Self::AddressOf(step) => Some(step),
            Self::Value(_) => None,
        }
    }
}

impl From<ArgValue> for ArgTemplate {
    fn from(value: ArgValue) -> Self {
        Self::Value(value)
    }
}

/// One artifact deployment in a plan
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    name: String,
    artifact: ArtifactDefinition,
    args: Vec<ArgTemplate>,
    link_override: Option<Vec<LinkReference>>,
    library: Option<String>,
    after: Vec<String>,
}

impl PlanStep {
    /// Create a step deploying `artifact` with no arguments
    #[must_use]
    pub fn new(name: impl Into<String>, artifact: ArtifactDefinition) -> Self {
        Self {
            name: name.into(),
            artifact,
            args: Vec::new(),
            link_override: None,
            library: None,
            after: Vec::new(),
        }
    }

    /// With constructor arguments
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = ArgTemplate>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Use these link references instead of the artifact's own
    #[must_use]
    pub fn with_link_references(mut self, references: Vec<LinkReference>) -> Self {
        self.link_override = Some(references);
        self
    }

    /// Publish the deployed address as a library under the artifact's name
    #[must_use]
    pub fn as_library(mut self) -> Self {
        self.library = Some(self.artifact.name().to_string());
        self
    }

    /// Publish the deployed address as a library under `library`
    #[must_use]
    pub fn as_library_named(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Deploy only after `step`, without consuming its address
    #[must_use]
    pub fn after(mut self, step: impl Into<String>) -> Self {
        self.after.push(step.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn artifact(&self) -> &ArtifactDefinition {
        &self.artifact
    }

    #[inline]
    #[must_use]
    pub fn args(&self) -> &[ArgTemplate] {
        &self.args
    }

    /// Library name this step publishes, if it is a library
    #[inline]
    #[must_use]
    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    /// Explicit ordering edges
    #[inline]
    #[must_use]
    pub fn ordered_after(&self) -> &[String] {
        &self.after
    }

    /// Effective link references
    #[must_use]
    pub fn link_references(&self) -> &[LinkReference] {
        self.link_override
            .as_deref()
            .unwrap_or_else(|| self.artifact.link_references())
    }

    /// Check if the bytecode must be linked before deployment
    #[inline]
    #[must_use]
    pub fn requires_linking(&self) -> bool {
        !self.link_references().is_empty()
    }

    /// Steps whose addresses are used as constructor arguments
    pub fn argument_dependencies(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(ArgTemplate::dependency)
    }

    /// Library names referenced by the link references
    pub fn linked_libraries(&self) -> impl Iterator<Item = &str> {
        self.link_references().iter().map(|r| r.library.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytelink_artifact::{Bytecode, Interface};

    fn artifact(name: &str) -> ArtifactDefinition {
        ArtifactDefinition::new(name, Interface::empty(), Bytecode::from_bytes(&[0u8; 64]))
            .with_link_references(vec![LinkReference::new("Own", 0, 20)])
    }

    #[test]
    fn bytes32_label_is_right_padded() {
        let Some(ArgValue::FixedBytes(word)) = ArgValue::bytes32_label("ETH") else {
            panic!("expected bytes");
        };
        assert_eq!(
            hex::encode(&word),
            "4554480000000000000000000000000000000000000000000000000000000000"
        );
        assert!(ArgValue::bytes32_label(&"x".repeat(33)).is_none());
    }

    #[test]
    fn link_override_replaces_artifact_references() {
        let step = PlanStep::new("s", artifact("A"));
        assert_eq!(step.linked_libraries().collect::<Vec<_>>(), ["Own"]);

        let step = step.with_link_references(vec![LinkReference::new("Other", 10, 20)]);
        assert_eq!(step.linked_libraries().collect::<Vec<_>>(), ["Other"]);
    }

    #[test]
    fn as_library_uses_artifact_name() {
        let step = PlanStep::new("lib_step", artifact("MathLib")).as_library();
        assert_eq!(step.library(), Some("MathLib"));
        let step = PlanStep::new("lib_step", artifact("MathLib")).as_library_named("Math");
        assert_eq!(step.library(), Some("Math"));
    }

    #[test]
    fn argument_dependencies_skip_values() {
        let step = PlanStep::new("s", artifact("A")).with_args([
            ArgTemplate::address_of("factory"),
            ArgValue::Uint(3).into(),
            ArgTemplate::address_of("weth9"),
        ]);
        assert_eq!(step.argument_dependencies().collect::<Vec<_>>(), ["factory", "weth9"]);
    }

    #[test]
    fn arg_value_serde_shape() {
        let v = ArgValue::FixedBytes(vec![0xab, 0xcd]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"type":"fixed_bytes","value":"0xabcd"}"#);
        assert_eq!(serde_json::from_str::<ArgValue>(&json).unwrap(), v);
    }
}
