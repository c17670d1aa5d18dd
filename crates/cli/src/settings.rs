//! Config file and data directory resolution

use anyhow::{Context, Result};
use autosave::AutoSaveConfig;
use std::path::{Path, PathBuf};

/// Default config file: `<config dir>/draftsave/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("draftsave").join("config.toml"))
}

/// Default fallback directory: `<local data dir>/draftsave/fallback`
pub fn default_fallback_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("Could not determine local data directory")?;
    Ok(base.join("draftsave").join("fallback"))
}

/// Load the effective config
///
/// An explicit path must exist; the default path may be absent.
pub fn load(explicit: Option<&Path>) -> Result<AutoSaveConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            AutoSaveConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))
        }
        None => match config_file_path() {
            Some(path) => AutoSaveConfig::load(&path)
                .with_context(|| format!("Failed to load {}", path.display())),
            None => Ok(AutoSaveConfig::default()),
        },
    }
}

/// Annotated example config
pub fn example_config() -> String {
    let defaults = AutoSaveConfig::default();
    format!(
        r#"# draftsave configuration

[autosave]
# Turn automatic saving off (manual flush still works)
enabled = {enabled}

# Quiet period after the last edit before saving (0-3600000)
debounce_ms = {debounce}

# How long "Saved" stays visible (0-600000)
saved_display_ms = {display}

# Name of the local fallback copy
fallback_key = "{key}"
"#,
        enabled = defaults.enabled,
        debounce = defaults.debounce_ms,
        display = defaults.saved_display_ms,
        key = defaults.fallback_key,
    )
}
