//! bytelink artifacts
//!
//! Compiled artifact definitions and the bytecode linker.
//!
//! # Core Concepts
//!
//! - [`ArtifactDefinition`]: interface, bytecode and link references of one
//!   deployable binary
//! - [`LinkReference`]: a fixed-offset placeholder region, in bytes
//! - [`AddressMap`]: library name to resolved [`Address`]
//! - [`link()`]: pure, length-preserving rewrite of placeholder regions
//! - [`ArtifactSource`]: where plans get their definitions from
//!
//! # Example
//!
//! ```rust
//! use bytelink_artifact::{link, Address, AddressMap, Bytecode, LinkReference};
//!
//! let template = Bytecode::from_bytes(&[0u8; 64]);
//! let refs = [LinkReference::new("Math", 10, 20)];
//! let resolved = AddressMap::from_pairs([("Math", Address::repeat_byte(0xaa, 20))]).unwrap();
//!
//! let linked = link(&template, &refs, &resolved).unwrap();
//! assert_eq!(linked.len(), template.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod address;
mod artifact;
mod bytecode;
mod link;
mod source;

pub use address::{Address, AddressError, AddressMap};
pub use artifact::{ArtifactDefinition, ArtifactError, Interface};
pub use bytecode::{Bytecode, BytecodeError};
pub use link::{
    check_placeholder_coverage, link, validate_references, InvalidReason, LinkError, LinkReference,
};
pub use source::{parse_compiler_artifact, ArtifactSource, ArtifactStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
