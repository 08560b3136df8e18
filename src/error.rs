// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for autosort

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for autosort operations
pub type Result<T> = std::result::Result<T, SorterError>;

/// Startup and configuration errors. These are fatal to the caller.
#[derive(Error, Debug)]
pub enum SorterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid ignore pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Cannot watch {path:?}: {source}")]
    WatchRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create folder {path:?}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Per-file move failures. Never propagated past the per-file task.
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("source has no file name: {0:?}")]
    NoFileName(PathBuf),

    #[error("failed to create target directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("destination already occupied: {0:?}")]
    DestinationOccupied(PathBuf),

    #[error("failed to move file to {destination:?}: {source}")]
    Rename {
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot check destination name {path:?}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free name for {0:?} after {1} attempts")]
    NamesExhausted(PathBuf, u64),

    #[error("file left at both {original:?} and {destination:?}: unlink failed ({unlink}), undo failed: {source}")]
    LeftAtBothNames {
        original: PathBuf,
        destination: PathBuf,
        unlink: std::io::Error,
        #[source]
        source: std::io::Error,
    },
}
