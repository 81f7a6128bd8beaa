//! Recursive workspace watch for the heuristic detector.

use std::collections::HashSet;
use std::path::Path;

use tokio::sync::mpsc;

use crate::watch::{spawn_watch, FsEvent, WatchHandle, WatchMode, WatcherError};

/// Extension filter applied to workspace events.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    extensions: HashSet<String>,
}

impl ExtensionFilter {
    /// Build a filter from extensions, with or without the leading dot.
    #[must_use]
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    /// Whether events for `path` should be reported.
    ///
    /// An empty filter accepts every path.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }
}

/// Keeps the recursive workspace watch alive.
#[derive(Debug)]
pub struct WorkspaceWatcher {
    handle: WatchHandle,
}

impl WorkspaceWatcher {
    /// Watch `root` recursively, reporting only files accepted by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing or cannot be watched.
    pub fn new(
        root: &Path,
        filter: ExtensionFilter,
    ) -> Result<(Self, mpsc::UnboundedReceiver<FsEvent>), WatcherError> {
        let (handle, rx) = spawn_watch(root, WatchMode::Recursive, move |path| {
            filter.accepts(path)
        })?;
        tracing::info!(root = %root.display(), "Watching workspace for external changes");
        Ok((Self { handle }, rx))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.handle.root()
    }
}
