//! Configuration inspection command

use crate::settings;
use anyhow::Result;
use autosave::AutoSaveConfig;
use owo_colors::OwoColorize;
use std::path::Path;

/// List the effective configuration
pub async fn run_list(config: &AutoSaveConfig, source: Option<&Path>) -> Result<()> {
    println!("{}", "Auto-save Configuration".bold());
    match source {
        Some(path) => println!("{}: {}\n", "Location".dimmed(), path.display().dimmed()),
        None => println!("{}\n", "(defaults)".dimmed()),
    }

    println!("{}", "[autosave]".yellow());
    println!("  {} = {}", "enabled".cyan(), config.enabled);
    println!(
        "  {} = {} {}",
        "debounce_ms".cyan(),
        config.debounce_ms,
        format!("({:.1}s)", config.debounce_ms as f64 / 1000.0).dimmed()
    );
    println!(
        "  {} = {} {}",
        "saved_display_ms".cyan(),
        config.saved_display_ms,
        format!("({:.1}s)", config.saved_display_ms as f64 / 1000.0).dimmed()
    );
    println!("  {} = {:?}", "fallback_key".cyan(), config.fallback_key);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  debounce_ms: 0-{}", AutoSaveConfig::MAX_DEBOUNCE_MS);
    println!("  saved_display_ms: 0-{}", AutoSaveConfig::MAX_SAVED_DISPLAY_MS);

    Ok(())
}

/// Show the default config file path
pub async fn run_path() -> Result<()> {
    match settings::config_file_path() {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                println!("{}", "File does not exist; defaults are in effect.".yellow());
            }
        }
        None => println!("{}", "No config directory on this platform".yellow()),
    }
    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", settings::example_config());
    Ok(())
}
