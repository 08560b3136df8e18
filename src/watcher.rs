// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! File system notification sources

use async_trait::async_trait;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::info;

use crate::Result;

/// Events emitted by a notification source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A new entry appeared in the watched root
    Created(PathBuf),
    /// An entry was modified
    Modified(PathBuf),
    /// An entry was removed
    Removed(PathBuf),
    /// Watcher error
    Error(String),
}

/// A stream of change events for one root
#[async_trait]
pub trait EventSource: Send + 'static {
    /// Start delivering events for `root`
    fn watch(&mut self, root: &Path) -> Result<()>;

    /// Next event, or `None` once the source is closed and drained
    async fn next_event(&mut self) -> Option<WatchEvent>;

    /// Stop emitting and release resources
    fn close(&mut self) -> Result<()>;
}

/// Notification source backed by the platform watcher
pub struct FileWatcher {
    watcher: Option<RecommendedWatcher>,
    watched_paths: Vec<PathBuf>,
    event_rx: UnboundedReceiver<notify::Result<Event>>,
}

impl FileWatcher {
    /// Create a new file watcher
    pub fn new() -> Result<Self> {
        let (tx, rx) = unbounded_channel();

        // Runs on notify's thread; the send fails only after close.
        let handler = move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        };
        let watcher = RecommendedWatcher::new(handler, Config::default())?;

        Ok(Self {
            watcher: Some(watcher),
            watched_paths: Vec::new(),
            event_rx: rx,
        })
    }

    /// Convert notify event to our event type
    fn convert_event(event: Event) -> Option<WatchEvent> {
        let path = event.paths.first()?.clone();
        match event.kind {
            EventKind::Create(_) => Some(WatchEvent::Created(path)),
            // Moved into the root from elsewhere
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(WatchEvent::Created(path)),
            EventKind::Modify(_) => Some(WatchEvent::Modified(path)),
            EventKind::Remove(_) => Some(WatchEvent::Removed(path)),
            _ => None,
        }
    }

    /// Get currently watched paths
    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched_paths
    }
}

#[async_trait]
impl EventSource for FileWatcher {
    fn watch(&mut self, root: &Path) -> Result<()> {
        let watcher = self.watcher.as_mut().ok_or_else(|| {
            crate::SorterError::InvalidState("watcher already closed".to_string())
        })?;
        watcher.watch(root, RecursiveMode::NonRecursive)?;
        self.watched_paths.push(root.to_path_buf());
        info!("Watching: {:?}", root);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<WatchEvent> {
        loop {
            match self.event_rx.recv().await? {
                Ok(event) => {
                    if let Some(converted) = Self::convert_event(event) {
                        return Some(converted);
                    }
                }
                Err(e) => return Some(WatchEvent::Error(e.to_string())),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut watcher) = self.watcher.take() {
            for path in self.watched_paths.drain(..) {
                watcher.unwatch(&path)?;
                info!("Stopped watching: {:?}", path);
            }
        }
        // Dropping the watcher drops the sender, ending the stream.
        self.event_rx.close();
        Ok(())
    }
}

/// In-process source fed through a channel, for embedding and tests
pub struct ChannelSource {
    root: Option<PathBuf>,
    rx: UnboundedReceiver<WatchEvent>,
}

impl ChannelSource {
    pub fn new() -> (UnboundedSender<WatchEvent>, Self) {
        let (tx, rx) = unbounded_channel();
        (tx, Self { root: None, rx })
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    fn watch(&mut self, root: &Path) -> Result<()> {
        self.root = Some(root.to_path_buf());
        Ok(())
    }

    async fn next_event(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }

    fn close(&mut self) -> Result<()> {
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_convert_create_and_rename_in() {
        assert_eq!(
            FileWatcher::convert_event(event(EventKind::Create(CreateKind::File), "/w/a")),
            Some(WatchEvent::Created(PathBuf::from("/w/a")))
        );
        assert_eq!(
            FileWatcher::convert_event(event(
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                "/w/b"
            )),
            Some(WatchEvent::Created(PathBuf::from("/w/b")))
        );
    }

    #[test]
    fn test_convert_other_kinds() {
        assert_eq!(
            FileWatcher::convert_event(event(EventKind::Remove(RemoveKind::File), "/w/a")),
            Some(WatchEvent::Removed(PathBuf::from("/w/a")))
        );
        assert_eq!(FileWatcher::convert_event(Event::new(EventKind::Any)), None);
    }

    #[tokio::test]
    async fn test_channel_source_ends_after_close() {
        let (tx, mut source) = ChannelSource::new();
        source.watch(Path::new("/w")).unwrap();
        tx.send(WatchEvent::Created(PathBuf::from("/w/a"))).unwrap();
        source.close().unwrap();

        assert_eq!(source.root(), Some(Path::new("/w")));
        assert_eq!(
            source.next_event().await,
            Some(WatchEvent::Created(PathBuf::from("/w/a")))
        );
        assert_eq!(source.next_event().await, None);
        assert!(tx.send(WatchEvent::Created(PathBuf::from("/w/b"))).is_err());
    }

    #[tokio::test]
    async fn test_file_watcher_reports_new_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut watcher = FileWatcher::new().unwrap();
        watcher.watch(dir.path()).unwrap();
        assert_eq!(watcher.watched_paths(), &[dir.path().to_path_buf()]);

        std::fs::write(dir.path().join("new.txt"), b"hi").unwrap();

        let created = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            loop {
                match watcher.next_event().await {
                    Some(WatchEvent::Created(p)) => return Some(p),
                    Some(_) => continue,
                    None => return None,
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(
            created.and_then(|p| p.file_name().map(|n| n.to_owned())),
            Some("new.txt".into())
        );

        watcher.close().unwrap();
    }
}
