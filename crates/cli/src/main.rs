//! Draftsave CLI - draftsave command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cmd;
mod render;
mod settings;
mod sink;

/// Draftsave - debounced auto-save for JSON drafts
#[derive(Parser)]
#[command(name = "draftsave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/draftsave/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a draft file and auto-save it on change
    Watch {
        /// Draft JSON file
        draft: PathBuf,
        /// Directory saves are written to
        #[arg(short, long)]
        out: PathBuf,
        /// Override the debounce window
        #[arg(long)]
        debounce_ms: Option<u64>,
        /// Start with auto-save turned off
        #[arg(long)]
        disabled: bool,
        /// Fallback directory (default: <data dir>/draftsave/fallback)
        #[arg(long)]
        fallback_dir: Option<PathBuf>,
        /// Simulated latency of each save
        #[arg(long, default_value = "0")]
        latency_ms: u64,
    },
    /// Print the local fallback copy of a draft
    Recover {
        /// Fallback key (default: from config)
        #[arg(long)]
        key: Option<String>,
        /// Fallback directory (default: <data dir>/draftsave/fallback)
        #[arg(long)]
        fallback_dir: Option<PathBuf>,
    },
    /// Show configuration
    Config {
        /// Print the default config file path
        #[arg(long)]
        path: bool,
        /// Print an example config file
        #[arg(long)]
        example: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch {
            draft,
            out,
            debounce_ms,
            disabled,
            fallback_dir,
            latency_ms,
        } => {
            let mut config = config;
            if let Some(debounce_ms) = debounce_ms {
                config = config.with_debounce_ms(debounce_ms);
            }
            if disabled {
                config = config.with_enabled(false);
            }
            config.validate()?;

            let fallback_dir = match fallback_dir {
                Some(dir) => dir,
                None => settings::default_fallback_dir()?,
            };

            cmd::watch::run(cmd::watch::WatchOptions {
                draft,
                out_dir: out,
                fallback_dir,
                latency: Duration::from_millis(latency_ms),
                config,
            })
            .await
        }
        Commands::Recover { key, fallback_dir } => {
            let fallback_dir = match fallback_dir {
                Some(dir) => dir,
                None => settings::default_fallback_dir()?,
            };
            let key = key.unwrap_or(config.fallback_key);
            cmd::recover::run(&fallback_dir, &key).await
        }
        Commands::Config { path, example } => {
            if path {
                cmd::config::run_path().await
            } else if example {
                cmd::config::run_example().await
            } else {
                let source = cli.config.clone().or_else(settings::config_file_path);
                let source = source.filter(|p| p.exists());
                cmd::config::run_list(&config, source.as_deref()).await
            }
        }
    }
}
