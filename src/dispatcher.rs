// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Event dispatch: startup sweep, live events, shutdown
//!
//! One long-lived task reads the event source and spawns a task per created
//! file. A semaphore caps how many pipelines run at once; tasks waiting for a
//! permit are cheap, so the loop itself never waits on file work. Tasks for
//! different files finish in any order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, trace, warn};

use crate::config::SorterConfig;
use crate::mover::MoveOutcome;
use crate::pipeline::{PendingFile, Pipeline};
use crate::watcher::{EventSource, WatchEvent};
use crate::{Result, SorterError};

/// Lifecycle of a watched root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SorterState {
    Stopped,
    Watching,
}

/// Shared by the sweep and the dispatch loop
#[derive(Debug, Clone)]
struct Workers {
    pipeline: Arc<Pipeline>,
    permits: Arc<Semaphore>,
}

impl Workers {
    /// Spawn one file's pipeline; `settle` delays it before the first sample.
    /// Ignored names are dropped here, before they cost a task or a permit.
    fn spawn(&self, tasks: &mut JoinSet<MoveOutcome>, path: PathBuf, settle: Duration) {
        if self.pipeline.is_ignored(&path) {
            trace!("Ignoring {:?}", path);
            return;
        }
        let pipeline = Arc::clone(&self.pipeline);
        let permits = Arc::clone(&self.permits);
        let file = PendingFile::new(path);

        tasks.spawn(async move {
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
            // The semaphore is never closed, so acquire cannot fail.
            let _permit = permits.acquire_owned().await.ok();
            pipeline.process(file).await
        });
    }
}

fn reap(result: std::result::Result<MoveOutcome, tokio::task::JoinError>) {
    if let Err(e) = result {
        error!("File task failed: {}", e);
    }
}

/// Watches one root and sorts every file that appears in it
pub struct Sorter<S: EventSource> {
    root: PathBuf,
    folders: Vec<PathBuf>,
    dry_run: bool,
    settle_delay: Duration,
    workers: Workers,
    source: Option<S>,
    state: SorterState,
    shutdown_tx: Option<watch::Sender<bool>>,
    dispatch: Option<JoinHandle<()>>,
}

impl<S: EventSource> Sorter<S> {
    /// Build a sorter from configuration. Nothing is touched until `start`.
    pub fn new(config: &SorterConfig, source: S) -> Result<Self> {
        let pipeline = Pipeline::from_config(config)?;
        Ok(Self {
            root: config.watch_folder.clone(),
            folders: config.sort_rules.iter().map(|r| r.folder.clone()).collect(),
            dry_run: config.dry_run,
            settle_delay: config.settle_delay(),
            workers: Workers {
                pipeline: Arc::new(pipeline),
                permits: Arc::new(Semaphore::new(config.max_concurrent_tasks.max(1))),
            },
            source: Some(source),
            state: SorterState::Stopped,
            shutdown_tx: None,
            dispatch: None,
        })
    }

    pub fn state(&self) -> SorterState {
        self.state
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create sort folders, register the root, sweep existing files, then
    /// begin handling live events
    pub async fn start(&mut self) -> Result<()> {
        if self.state == SorterState::Watching {
            return Err(SorterError::InvalidState("already watching".to_string()));
        }
        if !self.dry_run {
            for folder in &self.folders {
                tokio::fs::create_dir_all(folder)
                    .await
                    .map_err(|e| SorterError::CreateFolder {
                        path: folder.clone(),
                        source: e,
                    })?;
            }
        }

        let meta = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| SorterError::WatchRoot {
                path: self.root.clone(),
                source: e,
            })?;
        if !meta.is_dir() {
            return Err(SorterError::WatchRoot {
                path: self.root.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let mut source = self
            .source
            .take()
            .ok_or_else(|| SorterError::InvalidState("event source already used".to_string()))?;
        source.watch(&self.root)?;
        info!("Started monitoring: {:?}", self.root);
        let rules = self.workers.pipeline.classifier().rules();
        info!("Loaded {} sort rules: {:?}", rules.len(), rules.categories());
        if self.dry_run {
            warn!("Running in DRY RUN mode - no files will be moved");
        }

        self.sweep().await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let workers = self.workers.clone();
        let settle = self.settle_delay;
        self.dispatch = Some(tokio::spawn(dispatch_loop(
            source,
            workers,
            settle,
            shutdown_rx,
        )));
        self.shutdown_tx = Some(shutdown_tx);
        self.state = SorterState::Watching;
        Ok(())
    }

    /// Process every file already in the root and wait for all of them
    async fn sweep(&self) {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Error reading watch folder: {}", e);
                return;
            }
        };

        let mut tasks = JoinSet::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
                    if !is_dir {
                        self.workers.spawn(&mut tasks, entry.path(), Duration::ZERO);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Error reading watch folder: {}", e);
                    break;
                }
            }
        }

        let queued = tasks.len();
        while let Some(result) = tasks.join_next().await {
            reap(result);
        }
        info!("Startup sweep processed {} entries", queued);
    }

    /// Stop watching and let in-flight files finish. Safe to call twice.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.dispatch.take() {
            handle
                .await
                .map_err(|e| SorterError::InvalidState(format!("dispatch loop failed: {}", e)))?;
            info!("Stopped monitoring: {:?}", self.root);
        }
        self.state = SorterState::Stopped;
        Ok(())
    }
}

async fn dispatch_loop<S: EventSource>(
    mut source: S,
    workers: Workers,
    settle: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut tasks: JoinSet<MoveOutcome> = JoinSet::new();

    loop {
        // Queued events are taken before shutdown so none is dropped.
        tokio::select! {
            biased;
            event = source.next_event() => match event {
                Some(WatchEvent::Created(path)) => workers.spawn(&mut tasks, path, settle),
                Some(WatchEvent::Error(e)) => warn!("Watch error: {}", e),
                Some(other) => trace!("Ignoring event: {:?}", other),
                None => break,
            },
            _ = shutdown_rx.changed() => break,
            Some(result) = tasks.join_next(), if !tasks.is_empty() => reap(result),
        }
    }

    if let Err(e) = source.close() {
        warn!("Failed to close event source: {}", e);
    }
    while let Some(result) = tasks.join_next().await {
        reap(result);
    }
}
