//! Resolved addresses
//!
//! Provides [`Address`], a byte string rendered as `0x`-prefixed hex, and
//! [`AddressMap`], the write-once table of library name to address that the
//! linker resolves placeholders against.

use indexmap::IndexMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

/// A deployed address
///
/// The length is carried by the value rather than the type so that a
/// placeholder/address size disagreement can be reported instead of being
/// made unrepresentable.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(Vec<u8>);

impl Address {
    /// Byte length of an EVM address
    pub const EVM_LEN: usize = 20;

    /// Create an address from raw bytes
    #[inline]
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Address made of `len` copies of `byte` (`0xaaaa...`)
    #[inline]
    #[must_use]
    pub fn repeat_byte(byte: u8, len: usize) -> Self {
        Self(vec![byte; len])
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex without the `0x` prefix
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(Self(hex::decode(digits)?))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes.to_vec())
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Address parsing and bookkeeping errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddressError {
    /// No hex digits after the prefix
    #[error("empty address")]
    Empty,

    /// Not valid hex
    #[error("invalid address hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Name already has an address
    #[error("address for `{0}` is already resolved")]
    AlreadyResolved(String),
}

/// Library name to resolved address
///
/// Entries are write-once and iterate in insertion order, which is the
/// order libraries were deployed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AddressMap {
    entries: IndexMap<String, Address>,
}

impl AddressMap {
    /// Create an empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from pairs, rejecting repeated names
    ///
    /// # Errors
    /// Returns [`AddressError::AlreadyResolved`] on the first repeated name
    pub fn from_pairs<I, N>(pairs: I) -> Result<Self, AddressError>
    where
        I: IntoIterator<Item = (N, Address)>,
        N: Into<String>,
    {
        let mut map = Self::new();
        for (name, address) in pairs {
            map.insert(name, address)?;
        }
        Ok(map)
    }

    /// Record the address for `name`
    ///
    /// # Errors
    /// Returns [`AddressError::AlreadyResolved`] if `name` already has one
    pub fn insert(&mut self, name: impl Into<String>, address: Address) -> Result<(), AddressError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(AddressError::AlreadyResolved(name));
        }
        self.entries.insert(name, address);
        Ok(())
    }

    /// Look up an address
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Address> {
        self.entries.get(name)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Address)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
