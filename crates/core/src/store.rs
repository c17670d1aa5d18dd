//! Best-effort fallback storage for draft snapshots
//!
//! The fallback store is a crash-recovery side channel, never the source of
//! truth. Writers treat every failure as advisory.
//!
//! `DirFallback` layout:
//! ```text
//! <root>/
//!   <key>.json    {"value": ..., "saved_at": "2024-05-01T10:42:00Z"}
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A locally stored copy of the last successfully saved value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRecord {
    /// Saved value, as JSON
    pub value: serde_json::Value,
    /// When the authoritative save succeeded
    pub saved_at: DateTime<Utc>,
}

impl FallbackRecord {
    pub fn new(value: serde_json::Value, saved_at: DateTime<Utc>) -> Self {
        Self { value, saved_at }
    }
}

/// Key-value side channel for fallback records
pub trait FallbackStore: Send + Sync {
    /// Store a record under `key`, replacing any previous one
    fn write(&self, key: &str, record: &FallbackRecord) -> Result<()>;

    /// Load the record stored under `key`
    fn read(&self, key: &str) -> Result<Option<FallbackRecord>>;

    /// Forget the record stored under `key`
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: FallbackStore + ?Sized> FallbackStore for Arc<S> {
    fn write(&self, key: &str, record: &FallbackRecord) -> Result<()> {
        (**self).write(key, record)
    }

    fn read(&self, key: &str) -> Result<Option<FallbackRecord>> {
        (**self).read(key)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Store that keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFallback;

impl FallbackStore for NoFallback {
    fn write(&self, _key: &str, _record: &FallbackRecord) -> Result<()> {
        Ok(())
    }

    fn read(&self, _key: &str) -> Result<Option<FallbackRecord>> {
        Ok(None)
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

/// In-process store, mostly useful for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryFallback {
    records: DashMap<String, FallbackRecord>,
}

impl MemoryFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FallbackStore for MemoryFallback {
    fn write(&self, key: &str, record: &FallbackRecord) -> Result<()> {
        self.records.insert(key.to_string(), record.clone());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<FallbackRecord>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct DirFallback {
    root: PathBuf,
}

impl DirFallback {
    /// Open (creating if needed) a fallback directory
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create fallback directory {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Directory holding the records
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `key`
    pub fn record_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl FallbackStore for DirFallback {
    fn write(&self, key: &str, record: &FallbackRecord) -> Result<()> {
        let path = self.record_path(key)?;
        let data = serde_json::to_vec(record).context("Failed to serialize fallback record")?;
        atomic_write(&path, &data)
    }

    fn read(&self, key: &str) -> Result<Option<FallbackRecord>> {
        let path = self.record_path(key)?;
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let record = serde_json::from_slice(&data)
            .with_context(|| format!("Corrupt fallback record at {}", path.display()))?;
        Ok(Some(record))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.record_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// Keys become file names: no separators, no leading dot
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        anyhow::bail!("Fallback key must not be empty");
    }
    if key.starts_with('.') {
        anyhow::bail!("Fallback key must not start with '.': {key}");
    }
    if key.contains(['/', '\\', '\0']) {
        anyhow::bail!("Fallback key must not contain path separators: {key}");
    }
    Ok(())
}

/// Atomic write helper
///
/// Writes data to a temporary file in the target's directory, fsyncs it, then
/// renames it over the target. Readers never observe a half-written file.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target)
        .with_context(|| format!("Failed to move temp file onto {}", target.display()))?;
    Ok(())
}
