//! CLI command implementations

pub mod config;
pub mod recover;
pub mod watch;
