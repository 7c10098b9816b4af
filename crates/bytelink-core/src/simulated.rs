//! In-process deployment client
//!
//! Assigns CREATE-style addresses without touching any network:
//! `sha256(sender ‖ nonce)[12..]`, nonce starting at zero and advancing on
//! every successful deployment. Two clients with the same sender hand out
//! the same address sequence.

use crate::client::{ClientError, DeployRequest, DeployedArtifact, DeploymentClient};
use bytelink_artifact::Address;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

#[derive(Debug, Default)]
struct Ledger {
    nonce: u64,
    requests: Vec<DeployRequest>,
}

/// Deterministic client for dry runs and tests
#[derive(Debug)]
pub struct SimulatedClient {
    sender: Address,
    ledger: Mutex<Ledger>,
    fail_at: Option<(String, ClientError)>,
}

impl SimulatedClient {
    /// Client deploying from `sender`
    #[must_use]
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            ledger: Mutex::new(Ledger::default()),
            fail_at: None,
        }
    }

    /// Fail every request for `step` with `error`
    #[must_use]
    pub fn failing_at(mut self, step: impl Into<String>, error: ClientError) -> Self {
        self.fail_at = Some((step.into(), error));
        self
    }

    #[inline]
    #[must_use]
    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Nonce the next deployment will use
    #[must_use]
    pub fn nonce(&self) -> u64 {
        self.ledger.lock().nonce
    }

    /// Every request received so far, including failed ones
    #[must_use]
    pub fn requests(&self) -> Vec<DeployRequest> {
        self.ledger.lock().requests.clone()
    }

    /// Address a deployment at `nonce` would receive
    #[must_use]
    pub fn address_at(&self, nonce: u64) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(self.sender.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();
        Address::new(&digest[12..])
    }
}

#[async_trait::async_trait]
impl DeploymentClient for SimulatedClient {
    async fn deploy_contract(&self, request: DeployRequest) -> Result<DeployedArtifact, ClientError> {
        let mut ledger = self.ledger.lock();
        ledger.requests.push(request.clone());

        if let Some((step, error)) = &self.fail_at {
            if *step == request.step {
                return Err(error.clone());
            }
        }
        if request.bytecode.is_empty() {
            return Err(ClientError::Rejected("empty bytecode".into()));
        }

        let address = self.address_at(ledger.nonce);
        ledger.nonce += 1;
        tracing::debug!(
            step = %request.step,
            %address,
            nonce = ledger.nonce - 1,
            "simulated deployment"
        );
        Ok(DeployedArtifact::new(request.artifact, address, request.interface))
    }
}
