// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Duplicate-name resolution and the move itself

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::error::MoveError;

/// Why a file was left where it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Ignored,
    Unstable,
    NotAFile,
    NoMatchingRule,
    SourceVanished,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Ignored => "ignored",
            SkipReason::Unstable => "still being written",
            SkipReason::NotAFile => "not a regular file",
            SkipReason::NoMatchingRule => "no matching rule",
            SkipReason::SourceVanished => "source vanished",
        };
        f.write_str(text)
    }
}

/// What happened to one file
#[derive(Debug)]
pub enum MoveStatus {
    Moved,
    WouldMove,
    Skipped(SkipReason),
    Failed(MoveError),
}

/// Record of one pipeline run, for logging only
#[derive(Debug)]
pub struct MoveOutcome {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub status: MoveStatus,
}

impl MoveOutcome {
    pub fn skipped(source: &Path, reason: SkipReason) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: None,
            status: MoveStatus::Skipped(reason),
        }
    }

    pub fn failed(source: &Path, destination: Option<PathBuf>, error: MoveError) -> Self {
        Self {
            source: source.to_path_buf(),
            destination,
            status: MoveStatus::Failed(error),
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self.status, MoveStatus::Moved)
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.status {
            MoveStatus::Skipped(reason) => Some(reason),
            _ => None,
        }
    }

    /// Emit the single log line for this outcome
    pub fn log(&self) {
        let dest = self.destination.as_deref().unwrap_or_else(|| Path::new(""));
        match &self.status {
            MoveStatus::Moved => info!("Moved: {:?} -> {:?}", self.source, dest),
            MoveStatus::WouldMove => info!("DRY RUN: Would move {:?} -> {:?}", self.source, dest),
            MoveStatus::Skipped(SkipReason::NoMatchingRule) => {
                info!("No matching rule for file: {:?}", self.source)
            }
            MoveStatus::Skipped(SkipReason::Unstable) => {
                info!("File still being written, skipping: {:?}", self.source)
            }
            MoveStatus::Skipped(reason) => debug!("Skipped {:?}: {}", self.source, reason),
            MoveStatus::Failed(e) => warn!("Error moving file {:?}: {}", self.source, e),
        }
    }
}

/// Highest `_N` suffix tried before giving up on a name
pub const MAX_SUFFIX: u64 = 10_000;

/// Whether anything (file, dir, dangling link) occupies `path`.
///
/// Only `NotFound` means free; any other error is returned, since a name
/// that cannot be checked cannot be claimed either.
async fn entry_exists(path: &Path) -> std::io::Result<bool> {
    match fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

async fn is_free(path: &Path) -> Result<bool, MoveError> {
    entry_exists(path)
        .await
        .map(|taken| !taken)
        .map_err(|e| MoveError::Resolve {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Return `target` if free, else the first free `name_N.ext` for
/// N = 1..=[`MAX_SUFFIX`]
///
/// The answer is only a snapshot: another task may claim the name before the
/// caller uses it.
pub async fn resolve_destination(target: &Path) -> Result<PathBuf, MoveError> {
    if is_free(target).await? {
        return Ok(target.to_path_buf());
    }

    let dir = target.parent().unwrap_or_else(|| Path::new(""));
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    for counter in 1..=MAX_SUFFIX {
        let candidate = dir.join(format!("{}_{}{}", stem, counter, ext));
        if is_free(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(MoveError::NamesExhausted(target.to_path_buf(), MAX_SUFFIX))
}

/// Creates destination folders and moves files into them
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveExecutor {
    dry_run: bool,
}

impl MoveExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Move `source` into `folder`, keeping its file name unless taken
    pub async fn execute(&self, source: &Path, folder: &Path) -> MoveOutcome {
        let Some(file_name) = source.file_name() else {
            return MoveOutcome::failed(source, None, MoveError::NoFileName(source.to_path_buf()));
        };

        let destination = match resolve_destination(&folder.join(file_name)).await {
            Ok(destination) => destination,
            Err(e) => return MoveOutcome::failed(source, None, e),
        };

        if self.dry_run {
            return MoveOutcome {
                source: source.to_path_buf(),
                destination: Some(destination),
                status: MoveStatus::WouldMove,
            };
        }

        // Idempotent: concurrent tasks may create the same folder.
        if let Err(e) = fs::create_dir_all(folder).await {
            return MoveOutcome::failed(
                source,
                Some(destination),
                MoveError::CreateDir {
                    path: folder.to_path_buf(),
                    source: e,
                },
            );
        }

        let status = match place(source, &destination).await {
            Ok(()) => MoveStatus::Moved,
            Err(Placement::SourceMissing) => MoveStatus::Skipped(SkipReason::SourceVanished),
            Err(Placement::Failed(e)) => MoveStatus::Failed(e),
        };

        MoveOutcome {
            source: source.to_path_buf(),
            destination: Some(destination),
            status,
        }
    }
}

enum Placement {
    SourceMissing,
    Failed(MoveError),
}

/// Move without ever replacing an existing entry at `destination`.
///
/// A hard link claims the name atomically and fails if it is taken; the
/// source name is then unlinked. Filesystems without hard links fall back to
/// a checked rename.
async fn place(source: &Path, destination: &Path) -> Result<(), Placement> {
    match fs::hard_link(source, destination).await {
        Ok(()) => {
            if let Err(e) = fs::remove_file(source).await {
                // Undo the link so the file is only at its original path.
                let undo = fs::remove_file(destination).await;
                return Err(unlink_failed(source, destination, e, undo));
            }
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Placement::Failed(
            MoveError::DestinationOccupied(destination.to_path_buf()),
        )),
        Err(e) => {
            if let Ok(false) = entry_exists(source).await {
                return Err(Placement::SourceMissing);
            }
            debug!("Hard link to {:?} failed ({}), using rename", destination, e);
            if !is_free(destination).await.map_err(Placement::Failed)? {
                return Err(Placement::Failed(MoveError::DestinationOccupied(
                    destination.to_path_buf(),
                )));
            }
            fs::rename(source, destination).await.map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    Placement::SourceMissing
                } else {
                    Placement::Failed(MoveError::Rename {
                        destination: destination.to_path_buf(),
                        source: e,
                    })
                }
            })
        }
    }
}

/// Classify a failed unlink after the hard link succeeded, given the result
/// of removing the link again
fn unlink_failed(
    source: &Path,
    destination: &Path,
    unlink: std::io::Error,
    undo: std::io::Result<()>,
) -> Placement {
    if let Err(undo) = undo {
        error!(
            "File is now at both {:?} and {:?}: unlink failed ({}), undo failed ({})",
            source, destination, unlink, undo
        );
        return Placement::Failed(MoveError::LeftAtBothNames {
            original: source.to_path_buf(),
            destination: destination.to_path_buf(),
            unlink,
            source: undo,
        });
    }
    if unlink.kind() == ErrorKind::NotFound {
        return Placement::SourceMissing;
    }
    Placement::Failed(MoveError::Rename {
        destination: destination.to_path_buf(),
        source: unlink,
    })
}
