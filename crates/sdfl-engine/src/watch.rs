//! File watcher for recompiling on save
//!
//! Watches the directory holding each input, so editors that save through a
//! temporary file and a rename keep being followed. An event only counts as
//! a change when the file's modification stamp differs from the last one
//! seen, which keeps the builder's own reads from triggering rebuilds.
//! [`watch_and_build`] rebuilds the outputs after every change until the
//! callback stops it.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use parking_lot::Mutex;

use crate::compiler::{Compilation, Compiler, InputKind};
use crate::output::OutputPaths;

/// Debounce window used when none is given
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Event emitted when a watched file changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A watched file was written
    Modified(PathBuf),
    /// A watched file no longer exists
    Deleted(PathBuf),
    /// An error occurred while watching
    Error(String),
}

/// Modification time and length; `None` when the file is missing
type Stamp = Option<(SystemTime, u64)>;

fn stamp(path: &Path) -> Stamp {
    std::fs::metadata(path)
        .ok()
        .map(|meta| (meta.modified().unwrap_or(UNIX_EPOCH), meta.len()))
}

/// Watches SDFL inputs for changes
pub struct SourceWatcher {
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<WatchEvent>,
    /// Canonical path of every watched file with its last seen stamp
    watched_paths: Arc<Mutex<BTreeMap<PathBuf, Stamp>>>,
}

impl SourceWatcher {
    /// Create a watcher; bursts of changes inside `debounce_ms` collapse into one event
    pub fn new(debounce_ms: Option<u64>) -> Result<Self> {
        let (tx, rx) = channel();
        let watched_paths = Arc::new(Mutex::new(BTreeMap::new()));
        let watched_paths_clone = watched_paths.clone();

        let debounce = Duration::from_millis(debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));

        let debouncer = new_debouncer(
            debounce,
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let mut paths: Vec<PathBuf> = events.into_iter().map(|e| e.path).collect();
                    paths.sort();
                    paths.dedup();

                    let mut watched = watched_paths_clone.lock();
                    for path in paths {
                        let Some(last) = watched.get_mut(&path) else {
                            continue;
                        };
                        let current = stamp(&path);
                        if *last == current {
                            continue;
                        }
                        *last = current;
                        let event = if current.is_some() {
                            WatchEvent::Modified(path)
                        } else {
                            WatchEvent::Deleted(path)
                        };
                        let _ = tx.send(event);
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchEvent::Error(format!("Watch error: {:?}", e)));
                }
            },
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {:?}", e))?;

        Ok(Self {
            debouncer,
            receiver: rx,
            watched_paths,
        })
    }

    /// Watch a file for changes. The file must exist.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .map_err(|e| anyhow!("Failed to watch path {}: {}", path.display(), e))?;
        let dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                anyhow!("Failed to watch path {}: no parent directory", canonical.display())
            })?;

        let dir_watched = {
            let mut watched = self.watched_paths.lock();
            let dir_watched = watched.keys().any(|p| p.parent() == Some(dir.as_path()));
            watched.insert(canonical.clone(), stamp(&canonical));
            dir_watched
        };

        if !dir_watched {
            let watching = self
                .debouncer
                .watcher()
                .watch(&dir, RecursiveMode::NonRecursive);
            if let Err(e) = watching {
                self.watched_paths.lock().remove(&canonical);
                return Err(anyhow!("Failed to watch directory {}: {}", dir.display(), e));
            }
        }

        tracing::info!("Watching: {}", canonical.display());
        Ok(())
    }

    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let unused_dir = {
            let mut watched = self.watched_paths.lock();
            if watched.remove(&canonical).is_none() {
                return Ok(());
            }
            canonical
                .parent()
                .filter(|dir| !watched.keys().any(|p| p.parent() == Some(*dir)))
                .map(Path::to_path_buf)
        };

        if let Some(dir) = unused_dir {
            self.debouncer
                .watcher()
                .unwatch(&dir)
                .map_err(|e| anyhow!("Failed to unwatch directory {}: {}", dir.display(), e))?;
        }

        Ok(())
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched_paths.lock().keys().cloned().collect()
    }

    /// Try to receive a watch event (non-blocking)
    pub fn try_recv(&self) -> Option<WatchEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive a watch event (blocking)
    pub fn recv(&self) -> Option<WatchEvent> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<WatchEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Get all pending events
    pub fn drain_events(&self) -> Vec<WatchEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Build `input` once, then again after every change.
///
/// `on_build` sees each result, failed builds included, and returns
/// `ControlFlow::Break` to stop watching.
pub fn watch_and_build<F>(
    compiler: &Compiler,
    input: &Path,
    kind: InputKind,
    outputs: &OutputPaths,
    debounce_ms: Option<u64>,
    mut on_build: F,
) -> Result<()>
where
    F: FnMut(&crate::Result<Compilation>) -> ControlFlow<()>,
{
    let mut watcher = SourceWatcher::new(debounce_ms)?;
    watcher.watch(input)?;

    if on_build(&compiler.build(input, kind, outputs)).is_break() {
        return Ok(());
    }

    while let Some(event) = watcher.recv() {
        match event {
            WatchEvent::Modified(path) => {
                tracing::info!("Change detected: {}", path.display());
                if on_build(&compiler.build(&path, kind, outputs)).is_break() {
                    break;
                }
            }
            WatchEvent::Deleted(path) => {
                tracing::warn!("Watched file was removed: {}", path.display());
            }
            WatchEvent::Error(message) => {
                tracing::warn!("{}", message);
            }
        }
    }

    Ok(())
}
