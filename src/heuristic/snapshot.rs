//! Last-known text of files seen by the heuristic detector.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Map from absolute path to its last-known text.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    texts: HashMap<PathBuf, String>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the text of `path`, returning the previous snapshot.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Option<String> {
        self.texts.insert(path.into(), text.into())
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.texts.get(path).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.texts.contains_key(path)
    }

    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.texts.remove(path)
    }

    pub fn clear(&mut self) {
        self.texts.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
