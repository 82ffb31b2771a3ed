//! Content hashing using blake3.
//!
//! Source text is keyed by its content hash everywhere it is cached or
//! correlated, so byte-identical snippets always share a key.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash the given bytes.
    #[inline]
    pub fn of<T: AsRef<[u8]> + ?Sized>(data: &T) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 16 hex chars are enough for log lines
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid content hash"))
    }
}
