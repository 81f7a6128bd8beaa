//! Live change feed for a workspace.
//!
//! Re-reads the newest session log of a workspace whenever it changes (or
//! on a fallback interval), re-extracts all of its changes from scratch,
//! and lets the tracker pick out the new ones.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::tracker::LiveChangeTracker;
use crate::session::{
    discover_session, find_project_sessions_dirs, try_load_session_changes, FileChange,
    LogWatcher,
};
use crate::watch::FsEvent;

/// Polls a workspace's session logs and feeds a [`LiveChangeTracker`].
#[derive(Debug)]
pub struct LiveFeed {
    roots: Vec<PathBuf>,
    workspace: PathBuf,
    tracker: LiveChangeTracker,
    /// Latest extraction per session log.
    cache: HashMap<PathBuf, Vec<FileChange>>,
    /// Set after the first poll; history found before it is not delivered.
    primed: bool,
}

impl LiveFeed {
    /// Create a feed for `workspace`, looking for logs under `roots`.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, workspace: PathBuf, tracker: LiveChangeTracker) -> Self {
        Self {
            roots,
            workspace,
            tracker,
            cache: HashMap::new(),
            primed: false,
        }
    }

    #[must_use]
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    #[must_use]
    pub fn tracker(&self) -> &LiveChangeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut LiveChangeTracker {
        &mut self.tracker
    }

    /// The session log currently considered active (most recent).
    #[must_use]
    pub fn current_session(&self) -> Option<PathBuf> {
        discover_session(&self.roots, &self.workspace)
    }

    /// Cached changes of a session from the last poll.
    #[must_use]
    pub fn changes(&self, session: &Path) -> Option<&[FileChange]> {
        self.cache.get(session).map(Vec::as_slice)
    }

    /// Poll the active session. Returns how many changes were new.
    pub async fn poll(&mut self) -> usize {
        match self.current_session() {
            Some(path) => self.poll_session(&path).await,
            None => {
                tracing::trace!(workspace = %self.workspace.display(), "No session log yet");
                self.primed = true;
                0
            }
        }
    }

    /// Re-extract one session log and feed its changes to the tracker.
    ///
    /// A log that cannot be read leaves the feed unprimed, so its history
    /// is still treated as baseline once it becomes readable.
    pub async fn poll_session(&mut self, path: &Path) -> usize {
        let changes = match try_load_session_changes(path).await {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read session log");
                return 0;
            }
        };
        let suppress = !self.primed;
        let fresh = self.tracker.process_changes(&changes, suppress);
        self.cache.insert(path.to_path_buf(), changes);
        self.primed = true;
        fresh
    }

    /// Point the feed at another workspace.
    ///
    /// Change ids of the old workspace are irrelevant, so the tracker is
    /// reset and the cache dropped.
    pub fn switch_workspace(&mut self, workspace: PathBuf) {
        tracing::info!(workspace = %workspace.display(), "Switching workspace");
        self.workspace = workspace;
        self.tracker.reset();
        self.cache.clear();
        self.primed = false;
    }

    /// Watch every sessions directory of the workspace.
    ///
    /// Directories that cannot be watched are skipped; polling still covers
    /// them.
    fn watch_sessions(&self) -> (Vec<LogWatcher>, mpsc::UnboundedReceiver<FsEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watchers = Vec::new();

        for dir in find_project_sessions_dirs(&self.roots, &self.workspace) {
            match LogWatcher::new(&dir) {
                Ok((watcher, mut dir_rx)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        while let Some(event) = dir_rx.recv().await {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                    });
                    watchers.push(watcher);
                }
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Cannot watch sessions directory");
                }
            }
        }

        (watchers, rx)
    }

    /// Poll on log activity and every `poll_interval` until `shutdown` fires.
    pub async fn run(&mut self, poll_interval: Duration, shutdown: CancellationToken) {
        let (watchers, mut log_rx) = self.watch_sessions();
        tracing::info!(
            workspace = %self.workspace.display(),
            watched_dirs = watchers.len(),
            "Live feed started"
        );

        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll().await;
                }
                Some(event) = log_rx.recv() => match event {
                    FsEvent::Error(e) => tracing::warn!(error = %e, "Session log watcher error"),
                    FsEvent::Removed(path) => {
                        self.cache.remove(&path);
                    }
                    FsEvent::Created(_) | FsEvent::Modified(_) | FsEvent::Renamed(_) => {
                        self.poll().await;
                    }
                },
            }
        }

        drop(watchers);
        tracing::info!("Live feed stopped");
    }
}
