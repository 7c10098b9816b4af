//! Bytecode linker
//!
//! Replaces library placeholders in [`Bytecode`] with resolved addresses.
//!
//! # Invariants
//!
//! - Every reference range `[start, start + length)` lies inside the
//!   bytecode and no two ranges overlap. This is checked for the whole set
//!   before anything is written.
//! - The resolved address must be exactly `length` bytes long.
//! - The output has the same byte length as the input and differs only
//!   inside the reference ranges. The input is never modified, so one
//!   template can be linked against several address sets.

use crate::address::AddressMap;
use crate::bytecode::Bytecode;
use serde::{Deserialize, Serialize};

/// One placeholder occurrence inside a bytecode blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkReference {
    /// Library name, the key looked up in the [`AddressMap`]
    pub library: String,
    /// Source unit the library was declared in, as reported by the compiler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Offset in bytes
    pub start: usize,
    /// Placeholder size in bytes
    pub length: usize,
}

impl LinkReference {
    /// Create a new reference
    #[inline]
    #[must_use]
    pub fn new(library: impl Into<String>, start: usize, length: usize) -> Self {
        Self {
            library: library.into(),
            source: None,
            start,
            length,
        }
    }

    /// With source unit name
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Exclusive end offset, `None` on overflow
    #[inline]
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        self.start.checked_add(self.length)
    }

    /// Check whether two ranges intersect
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self.end(), other.end()) {
            (Some(a_end), Some(b_end)) => self.start < b_end && other.start < a_end,
            _ => true,
        }
    }
}

/// Why a link reference was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
    #[error("placeholder has zero length")]
    ZeroLength,

    #[error("range exceeds bytecode length {bytecode_len}")]
    OutOfBounds { bytecode_len: usize },

    #[error("range overlaps reference to `{other}` at byte {other_start}")]
    Overlaps { other: String, other_start: usize },
}

/// Linking errors
///
/// None of these are transient; retrying with the same inputs fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// Reference does not describe a usable region of the bytecode
    #[error("invalid link reference to `{library}` at byte {start} (length {length}): {reason}")]
    InvalidLinkReference {
        library: String,
        start: usize,
        length: usize,
        reason: InvalidReason,
    },

    /// Placeholder size and resolved address size disagree
    #[error("link mismatch for `{library}`: placeholder is {expected} bytes, address is {actual} bytes")]
    LinkMismatch {
        library: String,
        expected: usize,
        actual: usize,
    },

    /// No address known for the library
    #[error("no resolved address for library `{0}`")]
    UnresolvedLibrary(String),

    /// Nothing to link
    #[error("bytecode is empty")]
    EmptyBytecode,

    /// Placeholder text that no reference covers
    #[error("placeholder at byte {offset} is not covered by any link reference")]
    UnreferencedPlaceholder { offset: usize },
}

impl LinkError {
    fn invalid(reference: &LinkReference, reason: InvalidReason) -> Self {
        Self::InvalidLinkReference {
            library: reference.library.clone(),
            start: reference.start,
            length: reference.length,
            reason,
        }
    }
}

/// Check a reference set against the bytecode it belongs to
///
/// Does not look at addresses, so it can run before any library is deployed.
///
/// # Errors
/// Returns [`LinkError::EmptyBytecode`] for an empty bytecode and
/// [`LinkError::InvalidLinkReference`] for a zero-length or out-of-bounds range, or two overlapping ranges.
pub fn validate_references(
    bytecode: &Bytecode,
    references: &[LinkReference],
) -> Result<(), LinkError> {
    if bytecode.is_empty() {
        return Err(LinkError::EmptyBytecode);
    }
    let bytecode_len = bytecode.len();

    for reference in references {
        if reference.length == 0 {
            return Err(LinkError::invalid(reference, InvalidReason::ZeroLength));
        }
        match reference.end() {
            Some(end) if end <= bytecode_len => {}
            _ => {
                return Err(LinkError::invalid(
                    reference,
                    InvalidReason::OutOfBounds { bytecode_len },
                ))
            }
        }
    }

    // Sorted by start, only the range reaching furthest can overlap the next one.
    let mut sorted: Vec<&LinkReference> = references.iter().collect();
    sorted.sort_by_key(|r| r.start);

    let mut furthest: Option<&LinkReference> = None;
    for reference in sorted {
        if let Some(prev) = furthest {
            if prev.overlaps(reference) {
                return Err(LinkError::invalid(
                    reference,
                    InvalidReason::Overlaps {
                        other: prev.library.clone(),
                        other_start: prev.start,
                    },
                ));
            }
        }
        if furthest.map_or(true, |prev| reference.end() > prev.end()) {
            furthest = Some(reference);
        }
    }

    Ok(())
}

/// Check that every placeholder byte lies inside some reference range
///
/// A placeholder left uncovered (missing reference or stale offset) would
/// survive linking and make the bytecode undeployable.
///
/// # Errors
/// Returns [`LinkError::UnreferencedPlaceholder`] with the first uncovered
/// byte offset
pub fn check_placeholder_coverage(
    bytecode: &Bytecode,
    references: &[LinkReference],
) -> Result<(), LinkError> {
    let covered = |offset: usize| {
        references
            .iter()
            .any(|r| r.start <= offset && r.end().is_some_and(|end| offset < end))
    };
    let uncovered = bytecode
        .as_hex()
        .as_bytes()
        .chunks(2)
        .enumerate()
        .find(|(offset, pair)| !pair.iter().all(u8::is_ascii_hexdigit) && !covered(*offset));

    match uncovered {
        Some((offset, _)) => Err(LinkError::UnreferencedPlaceholder { offset }),
        None => Ok(()),
    }
}

/// Link `bytecode` against `resolved`
///
/// Returns a new bytecode with every reference range replaced by the
/// library's address. References are independent, so their order in the
/// slice does not affect the result.
///
/// # Errors
/// - [`LinkError::EmptyBytecode`] if there is no bytecode at all
/// - [`LinkError::InvalidLinkReference`] if the reference set is malformed
/// - [`LinkError::UnresolvedLibrary`] if a library has no address
/// - [`LinkError::LinkMismatch`] if an address has the wrong length
pub fn link(
    bytecode: &Bytecode,
    references: &[LinkReference],
    resolved: &AddressMap,
) -> Result<Bytecode, LinkError> {
    validate_references(bytecode, references)?;

    let mut linked = bytecode.clone();
    for reference in references {
        let address = resolved
            .get(&reference.library)
            .ok_or_else(|| LinkError::UnresolvedLibrary(reference.library.clone()))?;

        if address.len() != reference.length {
            return Err(LinkError::LinkMismatch {
                library: reference.library.clone(),
                expected: reference.length,
                actual: address.len(),
            });
        }

        tracing::trace!(
            library = %reference.library,
            start = reference.start,
            %address,
            "patching link reference"
        );
        linked.patch_in_place(reference.start, address.as_bytes());
    }

    debug_assert_eq!(linked.len(), bytecode.len());
    Ok(linked)
}
