//! Content addresses
//!
//! Addresses are lowercase hex BLAKE3 digests. Consumers treat them as
//! opaque tokens: only equality, ordering and hashing are relied upon.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of an immutable object in the content-addressed graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    /// Wrap an existing address token without validating it
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Finish a hasher into an address
    pub fn from_hasher(hasher: &blake3::Hasher) -> Self {
        Self(hex::encode(hasher.finalize().as_bytes()))
    }

    /// Get the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display form (first 8 chars)
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        self.0.get(..end).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentAddress {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for ContentAddress {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl AsRef<str> for ContentAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Feed a length-prefixed field into a hasher
///
/// Prefixing keeps `("ab", "c")` and `("a", "bc")` from colliding.
pub(crate) fn hash_field(hasher: &mut blake3::Hasher, field: &[u8]) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form() {
        let addr = ContentAddress::new("0123456789abcdef");
        assert_eq!(addr.short(), "01234567");

        let tiny = ContentAddress::new("abc");
        assert_eq!(tiny.short(), "abc");
    }

    #[test]
    fn test_field_prefixing() {
        let mut a = blake3::Hasher::new();
        hash_field(&mut a, b"ab");
        hash_field(&mut a, b"c");

        let mut b = blake3::Hasher::new();
        hash_field(&mut b, b"a");
        hash_field(&mut b, b"bc");

        assert_ne!(ContentAddress::from_hasher(&a), ContentAddress::from_hasher(&b));
    }

    #[test]
    fn test_serde_transparent() {
        let addr = ContentAddress::new("deadbeef");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"deadbeef\"");
    }
}
