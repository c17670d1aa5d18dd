//! File-backed persistence target for the watch command

use anyhow::{Context, Result};
use async_trait::async_trait;
use autosave::Persister;
use draftsave_core::atomic_write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Writes each saved draft to one file, replacing it atomically
pub struct FileSink {
    target: PathBuf,
    latency: Duration,
}

impl FileSink {
    pub fn new(target: PathBuf) -> Self {
        Self {
            target,
            latency: Duration::ZERO,
        }
    }

    /// Add artificial delay before each write, to mimic a remote store
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

#[async_trait]
impl Persister<serde_json::Value> for FileSink {
    async fn persist(&self, value: serde_json::Value) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut data = serde_json::to_vec_pretty(&value).context("Failed to encode draft")?;
        data.push(b'\n');

        let target = self.target.clone();
        tokio::task::spawn_blocking(move || atomic_write(&target, &data))
            .await
            .context("Write task failed")?
            .with_context(|| format!("Failed to write {}", self.target.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sink_writes_pretty_json() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path().join("post.json"));

        sink.persist(json!({"title": "Hello"})).await.unwrap();

        let text = std::fs::read_to_string(sink.target()).unwrap();
        assert!(text.ends_with('\n'));
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, json!({"title": "Hello"}));
    }

    #[tokio::test]
    async fn test_sink_reports_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path().join("missing/post.json"));

        let err = sink.persist(json!({})).await.unwrap_err();
        assert!(format!("{:#}", err).contains("post.json"));
    }
}
