//! Testing utilities for the bytelink workspace
//!
//! Shared fixtures and a scripted deployment client.

#![allow(missing_docs)]

use async_trait::async_trait;
use bytelink_artifact::{Address, ArtifactDefinition, ArtifactStore, Bytecode, Interface, LinkReference};
use bytelink_core::{ClientError, DeployRequest, DeployedArtifact, DeploymentClient};
use bytelink_plan::{presets, ArgTemplate, DeploymentPlan, PlanStep};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Compiler-style placeholder: `__$` + 34 hex chars + `$__`, 20 bytes wide
pub fn placeholder(library: &str) -> String {
    let tag: String = library
        .bytes()
        .map(|b| format!("{b:02x}"))
        .chain(std::iter::repeat_with(|| "00".to_string()))
        .take(17)
        .collect();
    format!("__${tag}$__")
}

/// `size` bytes of `0x60` with a placeholder for each `(library, offset)`
pub fn bytecode_with_placeholders(size: usize, placeholders: &[(&str, usize)]) -> Bytecode {
    let mut hex = "60".repeat(size);
    for (library, offset) in placeholders {
        let begin = offset * 2;
        hex.replace_range(begin..begin + 40, &placeholder(library));
    }
    Bytecode::parse(&hex).unwrap()
}

/// Artifact of `size` bytes whose link references point at real placeholders
pub fn linkable_artifact(name: &str, size: usize, links: &[(&str, usize)]) -> ArtifactDefinition {
    let references = links
        .iter()
        .map(|(library, offset)| LinkReference::new(*library, *offset, Address::EVM_LEN))
        .collect();
    ArtifactDefinition::new(name, Interface::empty(), bytecode_with_placeholders(size, links))
        .with_link_references(references)
}

/// Artifact of `size` bytes with no link references
pub fn plain_artifact(name: &str, size: usize) -> ArtifactDefinition {
    ArtifactDefinition::new(name, Interface::empty(), Bytecode::from_bytes(&vec![0x60; size]))
}

/// Store holding every artifact the Uniswap V3 preset needs, the position
/// descriptor carrying a real placeholder at the preset's link offset
pub fn uniswap_v3_store() -> ArtifactStore {
    use presets::uniswap_v3::{ARTIFACTS, NFT_DESCRIPTOR, NFT_DESCRIPTOR_LINK_START, POSITION_DESCRIPTOR};

    let mut store = ArtifactStore::new();
    for name in ARTIFACTS {
        let artifact = if name == POSITION_DESCRIPTOR {
            linkable_artifact(name, 2048, &[(NFT_DESCRIPTOR, NFT_DESCRIPTOR_LINK_START)])
        } else {
            plain_artifact(name, 96)
        };
        store.insert(artifact).unwrap();
    }
    store
}

/// `s0 ← s1 ← … ← s{n-1}`: each step takes the previous step's address
pub fn chain_plan(n: usize) -> DeploymentPlan {
    let mut plan = DeploymentPlan::new();
    for i in 0..n {
        let name = format!("s{i}");
        let mut step = PlanStep::new(name.clone(), plain_artifact(&format!("S{i}"), 32));
        if i > 0 {
            step = step.with_args([ArgTemplate::address_of(format!("s{}", i - 1))]);
        }
        plan.add_step(step).unwrap();
    }
    plan
}

/// Deployment client that follows a script
///
/// Addresses are `repeat_byte(n, 20)` for the n-th successful deployment
/// (starting at 1) unless a fixed address is scripted for the step. Every
/// request is recorded, failed ones included.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    failures: HashMap<String, ClientError>,
    addresses: HashMap<String, Address>,
    requests: Mutex<Vec<DeployRequest>>,
    deployed: Mutex<u8>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `step` with `error`
    pub fn fail_at(mut self, step: &str, error: ClientError) -> Self {
        self.failures.insert(step.to_string(), error);
        self
    }

    /// Deploy `step` at `address`
    pub fn address_for(mut self, step: &str, address: Address) -> Self {
        self.addresses.insert(step.to_string(), address);
        self
    }

    pub fn requests(&self) -> Vec<DeployRequest> {
        self.requests.lock().clone()
    }

    /// Steps in the order they were requested
    pub fn requested_steps(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.step.clone()).collect()
    }
}

#[async_trait]
impl DeploymentClient for ScriptedClient {
    async fn deploy_contract(&self, request: DeployRequest) -> Result<DeployedArtifact, ClientError> {
        self.requests.lock().push(request.clone());
        if let Some(error) = self.failures.get(&request.step) {
            return Err(error.clone());
        }
        let address = match self.addresses.get(&request.step) {
            Some(address) => address.clone(),
            None => {
                let mut count = self.deployed.lock();
                *count += 1;
                Address::repeat_byte(*count, Address::EVM_LEN)
            }
        };
        Ok(DeployedArtifact::new(request.artifact, address, request.interface))
    }
}
