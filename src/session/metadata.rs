//! Session summaries.

use std::collections::BTreeSet;

use serde::Serialize;

use super::extractor::extract_changes;
use super::jsonl::SessionEvent;

/// Read-only summary of one session, computed on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub session_id: String,
    /// Timestamp of the first event that has one.
    pub start_time: Option<String>,
    /// Timestamp of the last event that has one.
    pub end_time: Option<String>,
    pub git_branch: Option<String>,
    pub change_count: usize,
    pub files: BTreeSet<String>,
}

impl SessionMetadata {
    /// Summarize a full event list.
    #[must_use]
    pub fn from_events(events: &[SessionEvent]) -> Self {
        let session_id = events
            .iter()
            .map(|e| e.session_id.as_str())
            .find(|id| !id.is_empty())
            .unwrap_or_default()
            .to_string();

        let mut timestamps = events
            .iter()
            .map(|e| e.timestamp.as_str())
            .filter(|ts| !ts.is_empty());
        let start_time = timestamps.next().map(str::to_string);
        let end_time = timestamps.last().map(str::to_string).or_else(|| start_time.clone());

        let git_branch = events
            .iter()
            .filter_map(|e| e.git_branch.as_deref())
            .find(|b| !b.is_empty())
            .map(str::to_string);

        let changes = extract_changes(events);
        let files = changes.iter().map(|c| c.file_path().to_string()).collect();

        Self {
            session_id,
            start_time,
            end_time,
            git_branch,
            change_count: changes.len(),
            files,
        }
    }
}
