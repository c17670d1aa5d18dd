//! Draftsave Core - snapshot and fallback storage primitives
//!
//! This crate provides:
//! - BLAKE3 content snapshots for change detection
//! - Fallback records and stores (memory, directory, none)
//! - Atomic file writes

pub mod snapshot;
pub mod store;

// Re-export main types for convenience
pub use snapshot::{canonical_json, Snapshot, SnapshotError};
pub use store::{
    atomic_write, DirFallback, FallbackRecord, FallbackStore, MemoryFallback, NoFallback,
    validate_key,
};

/// Common result type used throughout draftsave-core
pub type Result<T> = anyhow::Result<T>;
