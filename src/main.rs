// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! autosort: watch a folder and sort new files by rule

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

use autosort::{logging, FileWatcher, Sorter, SorterConfig};

/// autosort CLI - sorts files dropped into a folder
#[derive(Parser, Debug)]
#[command(name = "autosort")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Watch a folder and sort new files into folders by rule", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "./config.json")]
    config: PathBuf,

    /// Run in dry-run mode (don't actually move files)
    #[arg(long)]
    dry_run: bool,

    /// Generate a default configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long)]
    trace: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        if self.trace {
            "trace"
        } else if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = SorterConfig::load_or_create(&cli.config)
        .with_context(|| format!("failed to load config {:?}", cli.config))?;

    if cli.generate_config {
        println!("Configuration file generated at: {}", cli.config.display());
        println!("Edit the configuration file to customize sorting rules, then run the program again.");
        return Ok(());
    }

    if cli.dry_run {
        config.dry_run = true;
    }

    logging::init(&config, cli.log_level()).context("failed to set up logging")?;

    let watcher = FileWatcher::new().context("failed to create file watcher")?;
    let mut sorter = Sorter::new(&config, watcher).context("failed to build sorter")?;
    sorter.start().await.context("failed to start file sorter")?;

    info!("Auto-sort is running on {:?}. Press Ctrl+C to stop.", sorter.root());
    shutdown_signal().await;

    sorter.stop().await.context("failed to stop file sorter")?;
    info!("Auto-sort stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["autosort"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("./config.json"));
        assert!(!cli.dry_run);
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "autosort", "--config", "/tmp/sort.json", "--dry-run", "-v",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/sort.json"));
        assert!(cli.dry_run);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_cli_generate_config() {
        let cli = Cli::try_parse_from(["autosort", "--generate-config", "-q"]).unwrap();
        assert!(cli.generate_config);
        assert_eq!(cli.log_level(), "warn");
    }
}
