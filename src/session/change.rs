//! File change records.

use serde::{Serialize, Serializer};

/// Session id used for records that did not come from a session log.
pub const HEURISTIC_SESSION_ID: &str = "heuristic";

/// What a change does to its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// Targeted replacement of `old` by `new`.
    Edit { old: String, new: String },
    /// Full rewrite with `new`.
    Write { new: String },
    /// Deletion inferred from a shell `rm`.
    Delete,
    /// Synthetic change observed outside the log.
    Heuristic { new: String },
}

/// Tool that produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeTool {
    Edit,
    Write,
    Delete,
    Heuristic,
}

impl std::fmt::Display for ChangeTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Edit => "Edit",
            Self::Write => "Write",
            Self::Delete => "Delete",
            Self::Heuristic => "Heuristic",
        };
        f.write_str(name)
    }
}

/// One file-mutation intent, regardless of where it was observed.
///
/// Records are immutable once built; the content accessors and flags are
/// derived from [`ChangeKind`], so exactly one kind of semantics holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    session_id: String,
    timestamp: String,
    file_path: String,
    kind: ChangeKind,
    git_branch: Option<String>,
    message_uuid: String,
    parent_uuid: Option<String>,
    change_id: String,
}

impl FileChange {
    /// Build a record. The change id is derived from session, message and path.
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        message_uuid: impl Into<String>,
        file_path: impl Into<String>,
        kind: ChangeKind,
    ) -> Self {
        let session_id = session_id.into();
        let message_uuid = message_uuid.into();
        let file_path = file_path.into();
        let change_id = change_id(&session_id, &message_uuid, &file_path);
        Self {
            session_id,
            timestamp: String::new(),
            file_path,
            kind,
            git_branch: None,
            message_uuid,
            parent_uuid: None,
            change_id,
        }
    }

    /// Build a synthetic record for content observed outside the log.
    ///
    /// Gets a fresh uuid-like message token and the current time.
    #[must_use]
    pub fn heuristic(file_path: impl Into<String>, new_content: impl Into<String>) -> Self {
        Self::new(
            HEURISTIC_SESSION_ID,
            uuid::Uuid::new_v4().to_string(),
            file_path,
            ChangeKind::Heuristic {
                new: new_content.into(),
            },
        )
        .with_timestamp(chrono::Utc::now().to_rfc3339())
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    #[must_use]
    pub fn with_git_branch(mut self, git_branch: Option<String>) -> Self {
        self.git_branch = git_branch;
        self
    }

    #[must_use]
    pub fn with_parent_uuid(mut self, parent_uuid: Option<String>) -> Self {
        self.parent_uuid = parent_uuid;
        self
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    #[must_use]
    pub fn kind(&self) -> &ChangeKind {
        &self.kind
    }

    #[must_use]
    pub fn git_branch(&self) -> Option<&str> {
        self.git_branch.as_deref()
    }

    #[must_use]
    pub fn message_uuid(&self) -> &str {
        &self.message_uuid
    }

    #[must_use]
    pub fn parent_uuid(&self) -> Option<&str> {
        self.parent_uuid.as_deref()
    }

    /// Deduplication key: session id, message uuid and file path.
    #[must_use]
    pub fn change_id(&self) -> &str {
        &self.change_id
    }

    #[must_use]
    pub fn tool(&self) -> ChangeTool {
        match self.kind {
            ChangeKind::Edit { .. } => ChangeTool::Edit,
            ChangeKind::Write { .. } => ChangeTool::Write,
            ChangeKind::Delete => ChangeTool::Delete,
            ChangeKind::Heuristic { .. } => ChangeTool::Heuristic,
        }
    }

    /// Content before the change. Heuristic records report an empty string.
    #[must_use]
    pub fn old_content(&self) -> Option<&str> {
        match &self.kind {
            ChangeKind::Edit { old, .. } => Some(old),
            ChangeKind::Heuristic { .. } => Some(""),
            ChangeKind::Write { .. } | ChangeKind::Delete => None,
        }
    }

    #[must_use]
    pub fn new_content(&self) -> Option<&str> {
        match &self.kind {
            ChangeKind::Edit { new, .. }
            | ChangeKind::Write { new }
            | ChangeKind::Heuristic { new } => Some(new),
            ChangeKind::Delete => None,
        }
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(self.kind, ChangeKind::Delete)
    }

    #[must_use]
    pub fn is_heuristic(&self) -> bool {
        matches!(self.kind, ChangeKind::Heuristic { .. })
    }
}

/// Compose the deduplication key of a change.
#[must_use]
pub fn change_id(session_id: &str, message_uuid: &str, file_path: &str) -> String {
    format!("{session_id}:{message_uuid}:{file_path}")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileChangeRepr<'a> {
    session_id: &'a str,
    timestamp: &'a str,
    tool_name: ChangeTool,
    file_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_branch: Option<&'a str>,
    change_id: &'a str,
    message_uuid: &'a str,
    parent_uuid: Option<&'a str>,
    is_deleted: bool,
    is_heuristic: bool,
}

impl Serialize for FileChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FileChangeRepr {
            session_id: &self.session_id,
            timestamp: &self.timestamp,
            tool_name: self.tool(),
            file_path: &self.file_path,
            old_content: self.old_content(),
            new_content: self.new_content(),
            git_branch: self.git_branch(),
            change_id: &self.change_id,
            message_uuid: &self.message_uuid,
            parent_uuid: self.parent_uuid(),
            is_deleted: self.is_deleted(),
            is_heuristic: self.is_heuristic(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_id_composition() {
        let change = FileChange::new("s1", "m1", "/src/a.rs", ChangeKind::Delete);
        assert_eq!(change.change_id(), "s1:m1:/src/a.rs");
        assert_eq!(change.change_id(), change_id("s1", "m1", "/src/a.rs"));
    }

    #[test]
    fn test_edit_semantics() {
        let change = FileChange::new(
            "s",
            "m",
            "/a",
            ChangeKind::Edit {
                old: "x".into(),
                new: "y".into(),
            },
        );
        assert_eq!(change.tool(), ChangeTool::Edit);
        assert_eq!(change.old_content(), Some("x"));
        assert_eq!(change.new_content(), Some("y"));
        assert!(!change.is_deleted());
        assert!(!change.is_heuristic());
    }

    #[test]
    fn test_write_has_no_old_content() {
        let change = FileChange::new("s", "m", "/a", ChangeKind::Write { new: "X".into() });
        assert_eq!(change.new_content(), Some("X"));
        assert!(change.old_content().is_none());
    }

    #[test]
    fn test_delete_semantics() {
        let change = FileChange::new("s", "m", "./build", ChangeKind::Delete);
        assert!(change.is_deleted());
        assert!(change.old_content().is_none());
        assert!(change.new_content().is_none());
        assert_eq!(change.tool().to_string(), "Delete");
    }

    #[test]
    fn test_heuristic_record() {
        let a = FileChange::heuristic("/w/a.txt", "hello");
        let b = FileChange::heuristic("/w/a.txt", "hello");

        assert!(a.is_heuristic());
        assert_eq!(a.session_id(), HEURISTIC_SESSION_ID);
        assert_eq!(a.old_content(), Some(""));
        assert_eq!(a.new_content(), Some("hello"));
        assert!(!a.timestamp().is_empty());
        assert_ne!(a.change_id(), b.change_id());
    }

    #[test]
    fn test_serialize_flat_camel_case() {
        let change = FileChange::new("s", "m", "/a", ChangeKind::Write { new: "X".into() })
            .with_timestamp("2026-01-29T10:00:00Z")
            .with_git_branch(Some("main".to_string()))
            .with_parent_uuid(Some("p".to_string()));

        let value = serde_json::to_value(&change).unwrap();

        assert_eq!(value["toolName"], "Write");
        assert_eq!(value["newContent"], "X");
        assert!(value.get("oldContent").is_none());
        assert_eq!(value["gitBranch"], "main");
        assert_eq!(value["parentUuid"], "p");
        assert_eq!(value["changeId"], "s:m:/a");
        assert_eq!(value["isDeleted"], false);
        assert_eq!(value["isHeuristic"], false);
    }
}
