//! End-to-end tests for the draftsave binary

mod common;

use chrono::{TimeZone, Utc};
use common::DraftsaveCommand;
use draftsave_core::{DirFallback, FallbackRecord, FallbackStore};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_config_example_is_printed() {
    let home = TempDir::new().unwrap();

    let result = DraftsaveCommand::new(home.path()).args(&["config", "--example"]).execute();

    result.assert_success();
    assert!(result.stdout().contains("[autosave]"));
    assert!(result.stdout().contains("debounce_ms = 3000"));
}

#[test]
fn test_config_list_reads_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    std::fs::write(&config, "[autosave]\ndebounce_ms = 1500\nenabled = false\n").unwrap();

    let result = DraftsaveCommand::new(home.path())
        .args(&["config", "--config", config.to_str().unwrap()])
        .execute();

    result.assert_success();
    // Keys are colored, so check the lines piecewise
    let stdout = result.stdout();
    let debounce_line = stdout.lines().find(|l| l.contains("debounce_ms")).unwrap();
    assert!(debounce_line.contains("1500"));
    let enabled_line = stdout.lines().find(|l| l.contains("enabled")).unwrap();
    assert!(enabled_line.contains("false"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bad.toml");
    std::fs::write(&config, "[autosave]\ndebounce_ms = 99999999999\n").unwrap();

    let result = DraftsaveCommand::new(home.path())
        .args(&["config", "--config", config.to_str().unwrap()])
        .execute();

    result.assert_failure();
    assert!(result.stderr().contains("debounce_ms"));
}

#[test]
fn test_recover_prints_fallback_record() {
    let home = TempDir::new().unwrap();
    let fallback_dir = home.path().join("fallback");
    let store = DirFallback::open(&fallback_dir).unwrap();
    let saved_at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 42, 0).unwrap();
    store
        .write(
            "post-7",
            &FallbackRecord::new(json!({"title": "Recovered title"}), saved_at),
        )
        .unwrap();

    let result = DraftsaveCommand::new(home.path())
        .args(&[
            "recover",
            "--key",
            "post-7",
            "--fallback-dir",
            fallback_dir.to_str().unwrap(),
        ])
        .execute();

    result.assert_success();
    assert!(result.stdout().contains("Recovered title"));
    assert!(result.stdout().contains("2024-05-01"));
}

#[test]
fn test_recover_missing_key() {
    let home = TempDir::new().unwrap();
    let fallback_dir = home.path().join("fallback");

    let result = DraftsaveCommand::new(home.path())
        .args(&["recover", "--fallback-dir", fallback_dir.to_str().unwrap()])
        .execute();

    result.assert_success();
    assert!(result.stdout().contains("No fallback copy for"));
    assert!(result.stdout().contains("autosave-draft"));
}

#[test]
fn test_watch_requires_existing_draft() {
    let home = TempDir::new().unwrap();

    let result = DraftsaveCommand::new(home.path())
        .args(&[
            "watch",
            home.path().join("absent.json").to_str().unwrap(),
            "--out",
            home.path().join("out").to_str().unwrap(),
            "--fallback-dir",
            home.path().join("fallback").to_str().unwrap(),
        ])
        .execute();

    result.assert_failure();
    assert!(result.stderr().contains("Draft not found"));
}
