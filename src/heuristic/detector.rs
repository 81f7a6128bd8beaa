//! Heuristic change detection.
//!
//! Manufactures change records for file edits that never show up in a
//! session log, by diffing text snapshots taken at editor-observable points
//! (open, save, create) and by reading files that appear or change on disk.
//!
//! The detector is driven by one owner task. Settle timers run on the tokio
//! runtime, but they only read the file and send the result back through
//! the settled channel; every state change happens in the owner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::exclude::ExclusionSet;
use super::snapshot::SnapshotStore;
use super::watch::{ExtensionFilter, WorkspaceWatcher};
use crate::config::HeuristicConfig;
use crate::live::{deliver_reporting, ChangeSink, DebounceScheduler};
use crate::session::FileChange;
use crate::watch::{FsEvent, WatcherError};

/// Files nested deeper than this many directories below the workspace root
/// are treated as dependency trees and ignored by change detection.
pub const MAX_WATCH_DEPTH: usize = 3;

/// Which trigger started a settle timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleTrigger {
    /// A new file appeared on disk.
    Created,
    /// An untracked file changed on disk.
    Changed,
}

/// Result of a settle timer, sent back to the detector's owner.
#[derive(Debug)]
pub struct SettledFile {
    pub path: PathBuf,
    pub trigger: SettleTrigger,
    /// File text, or `None` if it could not be read as UTF-8.
    pub content: Option<String>,
    generation: u64,
}

/// Receiver of settled files. The owner passes each one to
/// [`HeuristicDetector::on_settled`].
pub type SettledReceiver = mpsc::UnboundedReceiver<SettledFile>;

/// Snapshot-diffing change detector for one workspace.
pub struct HeuristicDetector {
    root: PathBuf,
    settle_delay: Duration,
    max_content_chars: usize,
    exclusions: ExclusionSet,
    extensions: ExtensionFilter,
    snapshots: SnapshotStore,
    before_save: HashMap<PathBuf, String>,
    settle_timers: DebounceScheduler<PathBuf>,
    settling: HashMap<PathBuf, (SettleTrigger, u64)>,
    next_generation: u64,
    settled_tx: mpsc::UnboundedSender<SettledFile>,
    watcher: Option<WorkspaceWatcher>,
    enabled: bool,
    sink: Arc<dyn ChangeSink>,
}

impl std::fmt::Debug for HeuristicDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicDetector")
            .field("root", &self.root)
            .field("enabled", &self.enabled)
            .field("snapshots", &self.snapshots.len())
            .field("settling", &self.settling.len())
            .field("watching", &self.watcher.is_some())
            .finish_non_exhaustive()
    }
}

impl HeuristicDetector {
    /// Create a disabled detector for the workspace at `root`.
    ///
    /// Returns the detector and the receiver its settle timers report to.
    #[must_use]
    pub fn new(
        root: &Path,
        config: &HeuristicConfig,
        sink: Arc<dyn ChangeSink>,
    ) -> (Self, SettledReceiver) {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let detector = Self {
            root: root.to_path_buf(),
            settle_delay: config.settle_delay(),
            max_content_chars: config.max_content_chars,
            exclusions: ExclusionSet::new(root, &config.exclude),
            extensions: ExtensionFilter::new(&config.extensions),
            snapshots: SnapshotStore::new(),
            before_save: HashMap::new(),
            settle_timers: DebounceScheduler::new(),
            settling: HashMap::new(),
            next_generation: 0,
            settled_tx,
            watcher: None,
            enabled: false,
            sink,
        };
        (detector, settled_rx)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_tracked(&self, path: &Path) -> bool {
        self.snapshots.contains(path)
    }

    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether a workspace watch is installed.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Number of settle timers still waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.settle_timers.pending_count()
    }

    /// Enable detection, silently snapshotting every visible document.
    ///
    /// This does not install the workspace watch. Use
    /// [`enable_watching`](Self::enable_watching) to do both, which is also
    /// required after [`disable`](Self::disable) since it drops the watch.
    pub fn enable<I>(&mut self, documents: I)
    where
        I: IntoIterator<Item = (PathBuf, String)>,
    {
        self.enabled = true;
        for (path, text) in documents {
            self.snapshots.insert(path, text);
        }
        tracing::info!(
            root = %self.root.display(),
            snapshots = self.snapshots.len(),
            "Heuristic detection enabled"
        );
    }

    /// Install the recursive workspace watch.
    ///
    /// Events from the returned receiver go to
    /// [`handle_fs_event`](Self::handle_fs_event). The watch is dropped by
    /// [`disable`](Self::disable).
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be watched.
    pub fn watch_workspace(&mut self) -> Result<mpsc::UnboundedReceiver<FsEvent>, WatcherError> {
        let (watcher, rx) = WorkspaceWatcher::new(&self.root, self.extensions.clone())?;
        self.watcher = Some(watcher);
        Ok(rx)
    }

    /// Enable detection and install the workspace watch.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be watched. Detection stays
    /// enabled for editor events in that case.
    pub fn enable_watching<I>(
        &mut self,
        documents: I,
    ) -> Result<mpsc::UnboundedReceiver<FsEvent>, WatcherError>
    where
        I: IntoIterator<Item = (PathBuf, String)>,
    {
        self.enable(documents);
        self.watch_workspace()
    }

    /// Disable detection, dropping the watch, timers, and snapshots.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.watcher = None;
        let cancelled = self.settle_timers.cancel_all();
        self.settling.clear();
        self.snapshots.clear();
        self.before_save.clear();
        tracing::info!(cancelled, "Heuristic detection disabled");
    }

    /// A new file appeared on disk.
    ///
    /// Returns `true` if a settle timer was started.
    pub fn on_file_created(&mut self, path: &Path) -> bool {
        if !self.enabled || self.snapshots.contains(path) || self.exclusions.is_excluded(path) {
            return false;
        }
        self.schedule_settle(path, SettleTrigger::Created);
        true
    }

    /// A file changed on disk.
    ///
    /// Only untracked files close to the workspace root are considered.
    /// Returns `true` if a settle timer was started.
    pub fn on_file_changed(&mut self, path: &Path) -> bool {
        if !self.enabled || self.snapshots.contains(path) {
            return false;
        }

        // A file created moments ago may still be receiving writes.
        if let Some((SettleTrigger::Created, _)) = self.settling.get(path) {
            self.schedule_settle(path, SettleTrigger::Created);
            return true;
        }

        match depth_below(&self.root, path) {
            Some(depth) if depth <= MAX_WATCH_DEPTH => {}
            depth => {
                tracing::trace!(path = %path.display(), ?depth, "Skipping deep or foreign path");
                return false;
            }
        }
        if self.exclusions.is_excluded(path) {
            return false;
        }

        self.schedule_settle(path, SettleTrigger::Changed);
        true
    }

    /// A file disappeared from disk.
    pub fn on_file_removed(&mut self, path: &Path) {
        self.snapshots.remove(path);
        self.forget_settle(path);
    }

    /// Handle a settle timer result.
    ///
    /// Returns the reported change, if any.
    pub async fn on_settled(&mut self, settled: SettledFile) -> Option<FileChange> {
        if !self.enabled {
            return None;
        }
        match self.settling.get(&settled.path) {
            Some(&(_, generation)) if generation == settled.generation => {
                self.settling.remove(&settled.path);
            }
            _ => {
                tracing::trace!(path = %settled.path.display(), "Dropping stale settle result");
                return None;
            }
        }

        let content = settled.content.filter(|text| !text.is_empty())?;

        if settled.trigger == SettleTrigger::Changed {
            if self.snapshots.contains(&settled.path) {
                return None;
            }
            let chars = content.chars().count();
            if chars > self.max_content_chars {
                tracing::debug!(
                    path = %settled.path.display(),
                    chars,
                    limit = self.max_content_chars,
                    "Skipping oversized file"
                );
                return None;
            }
        }

        self.snapshots.insert(settled.path.clone(), content.clone());
        Some(self.report(&settled.path, content).await)
    }

    /// A tracked document is about to be saved.
    pub fn on_will_save(&mut self, path: &Path) {
        if !self.enabled {
            return;
        }
        if let Some(text) = self.snapshots.get(path) {
            self.before_save.insert(path.to_path_buf(), text.to_string());
        }
    }

    /// A document was saved with `text`.
    ///
    /// Reports only if the text differs from the captured "before" state.
    pub async fn on_did_save(&mut self, path: &Path, text: &str) -> Option<FileChange> {
        if !self.enabled || self.exclusions.is_excluded(path) {
            return None;
        }

        let before = self
            .before_save
            .remove(path)
            .or_else(|| self.snapshots.get(path).map(str::to_string));
        self.snapshots.insert(path, text);

        match before {
            Some(before) if before != text => Some(self.report(path, text.to_string()).await),
            Some(_) => None,
            None => {
                tracing::trace!(path = %path.display(), "Saved untracked document");
                None
            }
        }
    }

    /// A document was opened.
    ///
    /// Untitled documents with content count as creations. Everything else
    /// is snapshotted silently.
    pub async fn on_document_opened(
        &mut self,
        path: &Path,
        text: &str,
        is_untitled: bool,
    ) -> Option<FileChange> {
        if !self.enabled || self.exclusions.is_excluded(path) {
            return None;
        }

        self.snapshots.insert(path, text);
        if is_untitled && !text.is_empty() {
            return Some(self.report(path, text.to_string()).await);
        }
        None
    }

    /// A document was closed.
    pub fn on_document_closed(&mut self, path: &Path) {
        self.snapshots.remove(path);
        self.before_save.remove(path);
        self.forget_settle(path);
    }

    /// Route a workspace watch event to the matching entry point.
    pub fn handle_fs_event(&mut self, event: FsEvent) {
        match event {
            FsEvent::Created(path) => {
                self.on_file_created(&path);
            }
            // A rename may replace an existing file, so it gets the
            // changed-file checks.
            FsEvent::Modified(path) | FsEvent::Renamed(path) => {
                self.on_file_changed(&path);
            }
            FsEvent::Removed(path) => self.on_file_removed(&path),
            FsEvent::Error(e) => tracing::warn!(error = %e, "Workspace watcher error"),
        }
    }

    /// Drive the detector from its watch and settle channels until
    /// `shutdown` fires.
    pub async fn run(
        mut self,
        mut fs_rx: mpsc::UnboundedReceiver<FsEvent>,
        mut settled_rx: SettledReceiver,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                Some(event) = fs_rx.recv() => self.handle_fs_event(event),
                Some(settled) = settled_rx.recv() => {
                    self.on_settled(settled).await;
                }
                else => break,
            }
        }
        self.disable();
    }

    fn schedule_settle(&mut self, path: &Path, trigger: SettleTrigger) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.settling
            .insert(path.to_path_buf(), (trigger, generation));

        let tx = self.settled_tx.clone();
        let file = path.to_path_buf();
        self.settle_timers
            .schedule(path.to_path_buf(), self.settle_delay, async move {
                let content = tokio::fs::read_to_string(&file).await.ok();
                let _ = tx.send(SettledFile {
                    path: file,
                    trigger,
                    content,
                    generation,
                });
            });
        tracing::trace!(path = %path.display(), ?trigger, "Settle timer started");
    }

    fn forget_settle(&mut self, path: &Path) {
        self.settle_timers.cancel(&path.to_path_buf());
        self.settling.remove(path);
    }

    async fn report(&self, path: &Path, content: String) -> FileChange {
        let change = FileChange::heuristic(path.to_string_lossy(), content);
        tracing::info!(file = %change.file_path(), "Heuristic change detected");
        deliver_reporting(self.sink.as_ref(), &change).await;
        change
    }
}

/// Number of directories between `root` and `path`, or `None` if `path` is
/// not under `root`.
fn depth_below(root: &Path, path: &Path) -> Option<usize> {
    let relative = path.strip_prefix(root).ok()?;
    Some(relative.components().count().saturating_sub(1))
}
