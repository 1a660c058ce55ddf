//! File watcher for dropped statements
//!
//! Watches one directory (non-recursive) and forwards newly created regular
//! files with the configured extension as [`CandidateFile`]s.

use crate::error::WatchError;
use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A created file eligible for processing. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Final path component, the key for credentials and results.
    pub name: String,
}

impl CandidateFile {
    /// Returns `None` when the path has no UTF-8 file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self { path, name })
    }
}

/// Whether `path`'s file name ends with `.<extension>` (case-sensitive).
pub fn matches_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(extension))
        .map(|stem| stem.ends_with('.'))
        .unwrap_or(false)
}

/// Classify one notification into zero or more candidates.
///
/// Only creations count. Directory creations are dropped; when the backend
/// does not say what was created, the path must currently be a regular file.
pub fn candidates_from_event(event: &Event, extension: &str) -> Vec<CandidateFile> {
    let kind = match event.kind {
        EventKind::Create(kind) => kind,
        _ => return Vec::new(),
    };
    if matches!(kind, CreateKind::Folder) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| matches_extension(path, extension))
        .filter(|path| matches!(kind, CreateKind::File) || path.is_file())
        .filter_map(|path| CandidateFile::from_path(path.clone()))
        .collect()
}

/// Live watch on one directory. Dropping it (or [`FileWatcher::stop`]) ends
/// the watch and closes the candidate channel.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    dir: PathBuf,
}

impl FileWatcher {
    /// Start watching `dir`.
    ///
    /// Candidates are delivered on the returned bounded channel. When it is
    /// full the notification thread blocks until the consumer catches up.
    pub fn start(
        dir: &Path,
        extension: &str,
        capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<CandidateFile>), WatchError> {
        if !dir.is_dir() {
            return Err(WatchError::NotADirectory(dir.display().to_string()));
        }

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let extension = extension.to_string();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let candidates = candidates_from_event(&event, &extension);
                    if candidates.is_empty() {
                        debug!(kind = ?event.kind, paths = ?event.paths, "Ignoring event");
                        return;
                    }
                    for candidate in candidates {
                        debug!(file = %candidate.name, "Candidate file created");
                        if tx.blocking_send(candidate).is_err() {
                            warn!("Candidate receiver closed; dropping event");
                            return;
                        }
                    }
                }
                Err(e) => error!("File watcher error: {}", e),
            }
        })?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!("Started watching {}", dir.display());

        Ok((
            Self {
                watcher,
                dir: dir.to_path_buf(),
            },
            rx,
        ))
    }

    /// Release the watch handle.
    pub fn stop(mut self) {
        if let Err(e) = self.watcher.unwatch(&self.dir) {
            warn!("Failed to unwatch {}: {}", self.dir.display(), e);
        }
        info!("Stopped watching {}", self.dir.display());
    }
}
