//! Hex-encoded bytecode
//!
//! Compiler output for contracts that call external libraries is not valid
//! hex: each call site carries a placeholder such as `__$1f9c...$__` in the
//! place of the library address. [`Bytecode`] therefore keeps the text form
//! and only decodes to raw bytes once every placeholder has been replaced.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Deployable bytecode in hex text form, two characters per byte
///
/// Offsets into bytecode are always counted in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bytecode(String);

impl Bytecode {
    /// Parse bytecode text, with or without the `0x` prefix
    ///
    /// Placeholder characters are accepted; see [`Bytecode::is_linked`].
    ///
    /// # Errors
    /// Returns error if the text is not ASCII or has an odd number of characters
    pub fn parse(text: &str) -> Result<Self, BytecodeError> {
        let body = text.trim();
        let body = body.strip_prefix("0x").unwrap_or(body);
        if let Some(position) = body.bytes().position(|b| !b.is_ascii_graphic()) {
            return Err(BytecodeError::InvalidCharacter { position });
        }
        if body.len() % 2 != 0 {
            return Err(BytecodeError::OddLength(body.len()));
        }
        Ok(Self(body.to_string()))
    }

    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len() / 2
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex text without prefix
    #[inline]
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// The hex text of bytes `[start, start + len)`, if in range
    #[must_use]
    pub fn slice(&self, start: usize, len: usize) -> Option<&str> {
        let end = start.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        self.0.get(start * 2..end * 2)
    }

    /// True when no placeholder text remains
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Byte offset of the first character that is not hex
    #[must_use]
    pub fn first_unlinked_offset(&self) -> Option<usize> {
        self.0
            .bytes()
            .position(|b| !b.is_ascii_hexdigit())
            .map(|pos| pos / 2)
    }

    /// Decode to raw bytes
    ///
    /// # Errors
    /// Returns [`BytecodeError::Unlinked`] if placeholder text remains
    pub fn to_bytes(&self) -> Result<Vec<u8>, BytecodeError> {
        if let Some(offset) = self.first_unlinked_offset() {
            return Err(BytecodeError::Unlinked { offset });
        }
        hex::decode(&self.0).map_err(BytecodeError::InvalidHex)
    }

    /// Overwrite bytes starting at `start` with `bytes`
    ///
    /// Callers check bounds; the range must lie within the bytecode.
    pub(crate) fn patch_in_place(&mut self, start: usize, bytes: &[u8]) {
        let begin = start * 2;
        self.0
            .replace_range(begin..begin + bytes.len() * 2, &hex::encode(bytes));
    }
}

impl Display for Bytecode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0)
    }
}

impl FromStr for Bytecode {
    type Err = BytecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&[u8]> for Bytecode {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Bytecode {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(&bytes)
    }
}

impl serde::Serialize for Bytecode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Bytecode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Bytecode parsing and decoding errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BytecodeError {
    /// Whitespace, control or non-ASCII character
    #[error("invalid bytecode character at position {position}")]
    InvalidCharacter { position: usize },

    /// Half a byte at the end
    #[error("bytecode has an odd number of hex characters ({0})")]
    OddLength(usize),

    /// Placeholder text was not linked
    #[error("bytecode still contains an unlinked placeholder at byte {offset}")]
    Unlinked { offset: usize },

    #[error("invalid bytecode hex: {0}")]
    InvalidHex(hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "__$0123456789abcdef0123456789abcdef01$__";

    #[test]
    fn parse_strips_prefix() {
        let code = Bytecode::parse("0x6080").unwrap();
        assert_eq!(code.as_hex(), "6080");
        assert_eq!(code.len(), 2);
        assert_eq!(code.to_string(), "0x6080");
    }

    #[test]
    fn parse_rejects_odd_length() {
        assert_eq!(Bytecode::parse("0x608"), Err(BytecodeError::OddLength(3)));
    }

    #[test]
    fn parse_rejects_whitespace_inside() {
        assert_eq!(
            Bytecode::parse("60 80"),
            Err(BytecodeError::InvalidCharacter { position: 2 })
        );
    }

    #[test]
    fn placeholder_is_forty_characters() {
        assert_eq!(PLACEHOLDER.len(), 40);
    }

    #[test]
    fn placeholder_blocks_decoding() {
        let code = Bytecode::parse(&format!("0x6080{PLACEHOLDER}00")).unwrap();
        assert_eq!(code.len(), 23);
        assert!(!code.is_linked());
        assert_eq!(code.first_unlinked_offset(), Some(2));
        assert_eq!(code.to_bytes(), Err(BytecodeError::Unlinked { offset: 2 }));
    }

    #[test]
    fn linked_bytecode_decodes() {
        let code = Bytecode::from_bytes(&[0x60, 0x80, 0x60, 0x40]);
        assert!(code.is_linked());
        assert_eq!(code.to_bytes().unwrap(), vec![0x60, 0x80, 0x60, 0x40]);
    }

    #[test]
    fn slice_is_byte_addressed() {
        let code = Bytecode::from_bytes(&[1, 2, 3, 4]);
        assert_eq!(code.slice(1, 2), Some("0203"));
        assert_eq!(code.slice(3, 2), None);
        assert_eq!(code.slice(usize::MAX, 2), None);
    }

    #[test]
    fn patch_only_touches_the_range() {
        let code = Bytecode::from_bytes(&[0; 4]);
        let mut out = code.clone();
        out.patch_in_place(1, &[0xff, 0xee]);
        assert_eq!(out.as_hex(), "00ffee00");
        assert_eq!(code.as_hex(), "00000000");
    }
}
