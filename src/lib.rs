// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! autosort: watch a folder and sort new files by rule
//!
//! Files appearing in the watched folder are checked against ignore rules,
//! given time to finish writing, classified by extension, content type or
//! keyword, and moved into the matching rule's folder without overwriting
//! anything already there.

pub mod classifier;
pub mod config;
pub mod content_type;
pub mod dispatcher;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod mover;
pub mod pipeline;
pub mod rules;
pub mod stability;
pub mod watcher;

pub use config::SorterConfig;
pub use dispatcher::{Sorter, SorterState};
pub use error::{MoveError, Result, SorterError};
pub use mover::{MoveOutcome, MoveStatus, SkipReason};
pub use pipeline::{PendingFile, Pipeline};
pub use watcher::{ChannelSource, EventSource, FileWatcher, WatchEvent};
