//! Debounced, single-flight auto-save
//!
//! This crate provides:
//! - Change detection by content snapshot
//! - A debounce countdown that coalesces bursts of edits into one save
//! - At most one persistence call in flight, with queued follow-ups
//! - Observable save status (`idle`, `saving`, `saved`, `error`)
//! - Best-effort local fallback copies of saved values
//!
//! ```ignore
//! let autosave = AutoSave::builder(persist_fn(|draft: Draft| async move { api.save(draft).await }))
//!     .config(AutoSaveConfig::default())
//!     .fallback(DirFallback::open(&dir)?)
//!     .build();
//!
//! autosave.observe(&draft); // on every edit
//! let label = autosave.state().label();
//! ```

pub mod config;
pub mod coordinator;
mod debounce;
mod executor;
pub mod persist;
pub mod status;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::{AutoSaveConfig, ConfigError};
pub use coordinator::{AutoSave, AutoSaveBuilder};
pub use persist::{persist_fn, FnPersister, Persister};
pub use status::{describe, SaveState, SaveStatus, StatusLabel, Tone, GENERIC_ERROR_LABEL};
