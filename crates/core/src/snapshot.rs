//! Content snapshots for change detection
//!
//! A snapshot is the BLAKE3 digest of a value's canonical JSON form. Two values
//! with the same serialized content produce equal snapshots regardless of
//! where they live in memory.

use serde::Serialize;
use thiserror::Error;

/// Value could not be turned into JSON
#[derive(Debug, Error)]
#[error("value is not serializable as JSON: {0}")]
pub struct SnapshotError(#[from] serde_json::Error);

/// Comparison-only fingerprint of a serialized value
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct Snapshot {
    digest: blake3::Hash,
    len: usize,
}

impl Snapshot {
    /// Snapshot a serializable value
    ///
    /// Map keys are ordered before hashing, so two maps holding the same
    /// entries in different insertion orders compare equal.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, SnapshotError> {
        let bytes = canonical_json(value)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Snapshot an already-serialized representation
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            digest: blake3::hash(bytes),
            len: bytes.len(),
        }
    }

    /// Length of the serialized form in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the serialized form was empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hex form of the digest
    pub fn to_hex(&self) -> String {
        self.digest.to_hex().to_string()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot({}, {} bytes)", &self.digest.to_hex()[..16], self.len)
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Serialize a value to JSON with deterministic map ordering
///
/// Going through `serde_json::Value` sorts object keys, which keeps types
/// backed by `HashMap` stable across calls.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SnapshotError> {
    let tree = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&tree)?)
}
