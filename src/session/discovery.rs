//! Session path discovery utilities.
//!
//! Locates Claude Code session logs on disk. Each assistant instance root
//! (usually `~/.claude`) holds `projects/<hash>/*.jsonl`, one file per
//! session. Nothing here fails: missing or unreadable directories simply
//! contribute no sessions.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Convert a workspace path to the directory name used by Claude Code.
///
/// Every path separator and drive colon is replaced by `-`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use claude_changes::session::project_path_hash;
///
/// let hash = project_path_hash(Path::new("/home/user/project"));
/// assert_eq!(hash, "-home-user-project");
/// ```
#[must_use]
pub fn project_path_hash(project_path: &Path) -> String {
    project_path
        .to_string_lossy()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect()
}

/// Default assistant instance roots.
///
/// `~/.claude`, plus `$CLAUDE_CONFIG_DIR` when it is set and differs.
#[must_use]
pub fn default_instance_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".claude"));
    }
    if let Some(dir) = std::env::var_os("CLAUDE_CONFIG_DIR") {
        let dir = PathBuf::from(dir);
        if !roots.contains(&dir) {
            roots.push(dir);
        }
    }
    roots
}

/// Find the sessions directory for a workspace under one instance root.
///
/// Returns `None` if `<root>/projects/<hash>` doesn't exist.
#[must_use]
pub fn find_project_sessions_dir(root: &Path, project_path: &Path) -> Option<PathBuf> {
    let sessions_dir = root
        .join("projects")
        .join(project_path_hash(project_path));

    if sessions_dir.is_dir() {
        Some(sessions_dir)
    } else {
        None
    }
}

/// Find the sessions directories for a workspace across instance roots.
#[must_use]
pub fn find_project_sessions_dirs(roots: &[PathBuf], project_path: &Path) -> Vec<PathBuf> {
    roots
        .iter()
        .filter_map(|root| find_project_sessions_dir(root, project_path))
        .collect()
}

fn dated_sessions(dir: &Path) -> Vec<(PathBuf, SystemTime)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Cannot read sessions directory");
            return Vec::new();
        }
    };

    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "jsonl"))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = metadata.modified().ok()?;
            Some((entry.path(), modified))
        })
        .collect()
}

fn newest_first(mut sessions: Vec<(PathBuf, SystemTime)>) -> Vec<PathBuf> {
    sessions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sessions.into_iter().map(|(path, _)| path).collect()
}

/// List the session files in a directory, most recently modified first.
#[must_use]
pub fn list_sessions(dir: &Path) -> Vec<PathBuf> {
    newest_first(dated_sessions(dir))
}

/// List every session of a workspace across instance roots, most recent
/// first.
#[must_use]
pub fn list_workspace_sessions(roots: &[PathBuf], project_path: &Path) -> Vec<PathBuf> {
    let all = find_project_sessions_dirs(roots, project_path)
        .iter()
        .flat_map(|dir| dated_sessions(dir))
        .collect();
    newest_first(all)
}

/// Find the most recent session file in a directory.
#[must_use]
pub fn find_latest_session(dir: &Path) -> Option<PathBuf> {
    list_sessions(dir).into_iter().next()
}

/// Find a session file by its session ID across instance roots.
///
/// Session IDs are the filename without extension.
#[must_use]
pub fn find_session_by_id(
    roots: &[PathBuf],
    project_path: &Path,
    session_id: &str,
) -> Option<PathBuf> {
    find_project_sessions_dirs(roots, project_path)
        .into_iter()
        .map(|dir| dir.join(format!("{session_id}.jsonl")))
        .find(|path| path.is_file())
}

/// Discover the most recent session for a workspace.
#[must_use]
pub fn discover_session(roots: &[PathBuf], project_path: &Path) -> Option<PathBuf> {
    list_workspace_sessions(roots, project_path).into_iter().next()
}
