//! Claude Code session logs.
//!
//! Decoding of JSONL session files, change extraction, and locating the
//! session logs of a workspace.

mod change;
mod discovery;
mod error;
mod extractor;
mod jsonl;
mod log_watcher;
mod metadata;
mod reader;
mod tool;

pub use change::{change_id, ChangeKind, ChangeTool, FileChange, HEURISTIC_SESSION_ID};
pub use discovery::{
    default_instance_roots, discover_session, find_latest_session, find_project_sessions_dir,
    find_project_sessions_dirs, find_session_by_id, list_sessions, list_workspace_sessions,
    project_path_hash,
};
pub use error::DecodeError;
pub use extractor::{extract_changes, parse_rm_targets, ChangeExtractor};
pub use jsonl::*;
pub use log_watcher::{is_session_log, LogWatcher};
pub use metadata::SessionMetadata;
pub use reader::{
    load_session_changes, read_session_events, try_load_session_changes, try_read_session_events,
};
pub use tool::{BashInput, EditInput, ToolInvocation, WriteInput};
