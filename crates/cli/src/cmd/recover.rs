//! Show the local fallback copy of a draft

use anyhow::{Context, Result};
use chrono::Local;
use draftsave_core::{DirFallback, FallbackStore};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(fallback_dir: &Path, key: &str) -> Result<()> {
    let store = DirFallback::open(fallback_dir)?;

    let record = match store.read(key)? {
        Some(record) => record,
        None => {
            println!(
                "{} {}",
                "No fallback copy for".yellow(),
                key.cyan()
            );
            return Ok(());
        }
    };

    let saved_at = record.saved_at.with_timezone(&Local);
    println!("{}: {}", "Key".dimmed(), key.cyan());
    println!(
        "{}: {}",
        "Saved".dimmed(),
        saved_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&record.value).context("Failed to format record")?
    );

    Ok(())
}
