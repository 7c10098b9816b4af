//! bytelink core
//!
//! The deployment orchestrator and the clients it deploys through.
//!
//! # Example
//!
//! ```rust
//! use bytelink_artifact::{Address, ArtifactDefinition, Bytecode, Interface};
//! use bytelink_core::{DeployerConfig, Orchestrator, SimulatedClient};
//! use bytelink_plan::{ArgTemplate, DeploymentPlan, PlanStep};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let code = |name: &str| ArtifactDefinition::new(name, Interface::empty(), Bytecode::from_bytes(&[0x60; 8]));
//! let plan = DeploymentPlan::new()
//!     .with_step(PlanStep::new("factory", code("Factory")))?
//!     .with_step(PlanStep::new("router", code("Router")).with_args([ArgTemplate::address_of("factory")]))?;
//!
//! let client = Arc::new(SimulatedClient::new(Address::repeat_byte(0x11, 20)));
//! let deployment = Orchestrator::new(client, DeployerConfig::new()).deploy(&plan).await?;
//! assert_eq!(deployment.len(), 2);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod client;
mod config;
mod deployment;
mod error;
mod orchestrator;
mod simulated;
mod state;
mod timeout;

pub use client::{ClientError, DeployRequest, DeployedArtifact, DeploymentClient};
pub use config::DeployerConfig;
pub use deployment::{Deployment, RunId};
pub use error::{DeployCause, DeploymentError, ErrorKind};
pub use orchestrator::{deploy, Orchestrator};
pub use simulated::SimulatedClient;
pub use state::{RunState, TransitionError};
pub use timeout::TimeoutClient;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running deployments
    pub use crate::{
        deploy, DeployedArtifact, DeployerConfig, Deployment, DeploymentClient, DeploymentError,
        ErrorKind, Orchestrator,
    };
    pub use bytelink_artifact::{Address, AddressMap, ArtifactDefinition, ArtifactSource};
    pub use bytelink_plan::{ArgTemplate, ArgValue, DeploymentPlan, PlanStep};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
