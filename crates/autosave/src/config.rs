//! Auto-save configuration
//!
//! Loaded from the `[autosave]` table of a TOML file:
//! ```toml
//! [autosave]
//! enabled = true
//! debounce_ms = 3000
//! saved_display_ms = 2000
//! fallback_key = "autosave-draft"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{key} = {value} is out of range ({min}-{max})")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("fallback_key must not be empty")]
    EmptyFallbackKey,

    #[error("invalid fallback_key: {0}")]
    InvalidFallbackKey(String),
}

/// Coordinator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Master switch; when off `observe` does nothing
    pub enabled: bool,
    /// Quiet period after the last change before saving
    pub debounce_ms: u64,
    /// How long `saved` stays visible before reverting to `idle`
    pub saved_display_ms: u64,
    /// Key used for the local fallback copy
    pub fallback_key: String,
}

impl AutoSaveConfig {
    pub const DEFAULT_DEBOUNCE_MS: u64 = 3_000;
    pub const DEFAULT_SAVED_DISPLAY_MS: u64 = 2_000;
    pub const DEFAULT_FALLBACK_KEY: &'static str = "autosave-draft";

    pub const MAX_DEBOUNCE_MS: u64 = 3_600_000;
    pub const MAX_SAVED_DISPLAY_MS: u64 = 600_000;

    /// Debounce window as a `Duration`
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Saved-status display window as a `Duration`
    pub fn saved_display(&self) -> Duration {
        Duration::from_millis(self.saved_display_ms)
    }

    /// Builder-style debounce override
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Builder-style enabled override
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check every value against its valid range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("debounce_ms", self.debounce_ms, 0, Self::MAX_DEBOUNCE_MS)?;
        check_range(
            "saved_display_ms",
            self.saved_display_ms,
            0,
            Self::MAX_SAVED_DISPLAY_MS,
        )?;
        if self.fallback_key.trim().is_empty() {
            return Err(ConfigError::EmptyFallbackKey);
        }
        draftsave_core::validate_key(&self.fallback_key)
            .map_err(|e| ConfigError::InvalidFallbackKey(e.to_string()))?;
        Ok(())
    }

    /// Parse from TOML text containing an optional `[autosave]` table
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        file.autosave.validate()?;
        Ok(file.autosave)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: Self::DEFAULT_DEBOUNCE_MS,
            saved_display_ms: Self::DEFAULT_SAVED_DISPLAY_MS,
            fallback_key: Self::DEFAULT_FALLBACK_KEY.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    autosave: AutoSaveConfig,
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            key,
            value,
            min,
            max,
        });
    }
    Ok(())
}
