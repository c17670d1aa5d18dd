//! Helpers for running the `draftsave` binary in tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Command builder isolated from the user's config and data directories
pub struct DraftsaveCommand {
    home: PathBuf,
    args: Vec<String>,
}

impl DraftsaveCommand {
    pub fn new(home: impl AsRef<Path>) -> Self {
        Self {
            home: home.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn execute(&self) -> CommandResult {
        let output = Command::new(env!("CARGO_BIN_EXE_draftsave"))
            .args(&self.args)
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.home.join(".config"))
            .env("XDG_DATA_HOME", self.home.join(".local/share"))
            .env("TZ", "UTC")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run draftsave binary");
        CommandResult { output }
    }
}

pub struct CommandResult {
    output: Output,
}

impl CommandResult {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn assert_success(&self) -> &Self {
        assert!(
            self.output.status.success(),
            "command failed\nstdout: {}\nstderr: {}",
            self.stdout(),
            self.stderr()
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.output.status.success(),
            "command unexpectedly succeeded\nstdout: {}",
            self.stdout()
        );
        self
    }
}
