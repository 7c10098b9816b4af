//! bytelink plans
//!
//! Named deployment steps, the dependency graph derived from them, and a
//! deterministic execution order.
//!
//! # Example
//!
//! ```rust
//! use bytelink_artifact::{ArtifactDefinition, Bytecode, Interface};
//! use bytelink_plan::{ArgTemplate, DeploymentPlan, PlanStep};
//!
//! let code = || ArtifactDefinition::new("C", Interface::empty(), Bytecode::from_bytes(&[0u8; 8]));
//! let plan = DeploymentPlan::new()
//!     .with_step(PlanStep::new("router", code()).with_args([ArgTemplate::address_of("factory")]))?
//!     .with_step(PlanStep::new("factory", code()))?;
//!
//! assert_eq!(plan.validate()?.order(), ["factory", "router"]);
//! # Ok::<(), bytelink_plan::PlanError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod graph;
mod manifest;
mod plan;
pub mod presets;
mod step;

pub use error::PlanError;
pub use graph::DependencyGraph;
pub use manifest::{LibraryFlag, ManifestArg, ManifestStep, PlanManifest};
pub use plan::{DeploymentPlan, ValidatedPlan};
pub use step::{ArgTemplate, ArgValue, PlanStep};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
