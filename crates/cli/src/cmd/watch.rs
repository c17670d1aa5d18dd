//! Watch a draft file and auto-save it
//!
//! Every change to the draft is parsed and handed to the coordinator; saves
//! land in the output directory under the draft's file name.

use crate::render;
use crate::sink::FileSink;
use anyhow::{Context, Result};
use autosave::{AutoSave, AutoSaveConfig};
use draftsave_core::DirFallback;
use notify::{RecursiveMode, Watcher};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct WatchOptions {
    pub draft: PathBuf,
    pub out_dir: PathBuf,
    pub fallback_dir: PathBuf,
    pub latency: Duration,
    pub config: AutoSaveConfig,
}

pub async fn run(opts: WatchOptions) -> Result<()> {
    let draft = opts
        .draft
        .canonicalize()
        .with_context(|| format!("Draft not found: {}", opts.draft.display()))?;
    let file_name = draft
        .file_name()
        .context("Draft path has no file name")?
        .to_owned();
    let watch_dir = draft
        .parent()
        .context("Draft path has no parent directory")?
        .to_path_buf();

    std::fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("Failed to create {}", opts.out_dir.display()))?;
    let sink = FileSink::new(opts.out_dir.join(&file_name)).with_latency(opts.latency);
    let target = sink.target().to_path_buf();
    let fallback = DirFallback::open(&opts.fallback_dir)?;

    let autosave = AutoSave::builder(sink)
        .config(opts.config)
        .fallback(fallback)
        .build();

    // The draft as it is on disk now counts as saved
    match read_draft(&draft) {
        Ok(Some(value)) => autosave.seed(&value),
        Ok(None) => {}
        Err(e) => warn!("Initial draft unreadable: {:#}", e),
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = event_tx.send(res);
    })
    .context("Failed to create file watcher")?;
    // Editors often replace the file, so watch its directory
    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", watch_dir.display()))?;

    println!(
        "{} {} {} {}",
        "Watching".bold(),
        draft.display(),
        "→".dimmed(),
        target.display()
    );
    if !autosave.is_enabled() {
        println!("{}", "Auto-save disabled; edits are not saved".yellow());
    }
    info!(
        debounce_ms = autosave.config().debounce_ms,
        "Auto-save ready"
    );

    let mut states = autosave.subscribe();
    render::print_state(&states.borrow_and_update());

    loop {
        tokio::select! {
            Some(res) = event_rx.recv() => match res {
                Ok(event) if event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) => {
                    match read_draft(&draft) {
                        Ok(Some(value)) => {
                            if autosave.observe(&value) {
                                debug!("Draft changed");
                            }
                        }
                        Ok(None) => debug!("Draft empty, waiting for content"),
                        Err(e) => warn!("Skipping unreadable draft: {:#}", e),
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Watch error: {}", e),
            },
            Ok(()) = states.changed() => {
                let state = states.borrow_and_update().clone();
                render::print_state(&state);
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("Flushing before exit");
                let state = autosave.flush().await;
                render::print_state(&state);
                autosave.dispose();
                break;
            }
        }
    }

    drop(watcher);
    Ok(())
}

/// Read and parse the draft; `None` while the file is empty
fn read_draft(path: &Path) -> Result<Option<serde_json::Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_draft_variants() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("draft.json");

        std::fs::write(&path, "  \n").unwrap();
        assert!(read_draft(&path).unwrap().is_none());

        std::fs::write(&path, "{\"title\": \"Hi\"}").unwrap();
        assert_eq!(read_draft(&path).unwrap(), Some(json!({"title": "Hi"})));

        std::fs::write(&path, "{\"title\": ").unwrap();
        assert!(read_draft(&path).is_err());
    }
}
