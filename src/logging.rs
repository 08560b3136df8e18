// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Log sink selection

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::SorterConfig;
use crate::{Result, SorterError};

/// Install the global subscriber. `RUST_LOG` wins over `level`.
///
/// With `enable_logging` set, lines are appended to `log_file`; otherwise
/// they go to stdout.
pub fn init(config: &SorterConfig, level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = if config.enable_logging {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .map_err(|e| {
                SorterError::Logging(format!("cannot open log file {:?}: {}", config.log_file, e))
            })?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };

    installed.map_err(|e| SorterError::Logging(e.to_string()))
}
