//! Whole-file session log reading.
//!
//! A log is read completely and split into lines before any line is decoded.
//! Read failures degrade to an empty result.

use std::path::Path;

use super::change::FileChange;
use super::extractor::extract_changes;
use super::jsonl::{parse_jsonl_content, SessionEvent};

/// Read and decode every event of a session log.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be read.
pub async fn try_read_session_events(path: &Path) -> std::io::Result<Vec<SessionEvent>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(parse_jsonl_content(&String::from_utf8_lossy(&bytes)))
}

/// Read and decode every event of a session log.
///
/// Returns an empty list if the file cannot be read.
pub async fn read_session_events(path: &Path) -> Vec<SessionEvent> {
    match try_read_session_events(path).await {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot read session log");
            Vec::new()
        }
    }
}

/// Read a session log and extract its file changes.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be read.
pub async fn try_load_session_changes(path: &Path) -> std::io::Result<Vec<FileChange>> {
    let events = try_read_session_events(path).await?;
    let changes = extract_changes(&events);
    tracing::debug!(
        path = %path.display(),
        events = events.len(),
        changes = changes.len(),
        "Loaded session changes"
    );
    Ok(changes)
}

/// Read a session log and extract its file changes.
///
/// Returns an empty list if the file cannot be read.
pub async fn load_session_changes(path: &Path) -> Vec<FileChange> {
    match try_load_session_changes(path).await {
        Ok(changes) => changes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot read session log");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_entry(uuid: &str, path: &str) -> String {
        format!(
            r#"{{"type":"assistant","uuid":"{uuid}","parentUuid":null,"sessionId":"sess-1","timestamp":"2026-01-29T10:00:00Z","message":{{"role":"assistant","content":[{{"type":"tool_use","id":"t-{uuid}","name":"Write","input":{{"file_path":"{path}","content":"x"}}}}]}}}}"#
        )
    }

    #[tokio::test]
    async fn test_read_session_events() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", write_entry("u1", "/a")).unwrap();
        writeln!(file, "not valid json").unwrap();
        writeln!(file, "{}", write_entry("u2", "/b")).unwrap();
        file.flush().unwrap();

        let events = read_session_events(file.path()).await;

        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_trailing_line_is_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", write_entry("u1", "/a")).unwrap();
        let partial = write_entry("u2", "/b");
        write!(file, "{}", &partial[..partial.len() / 2]).unwrap();
        file.flush().unwrap();

        let changes = load_session_changes(file.path()).await;

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file_path(), "/a");
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty() {
        let path = Path::new("/tmp/nonexistent-session-12345.jsonl");
        assert!(read_session_events(path).await.is_empty());
        assert!(load_session_changes(path).await.is_empty());
        assert!(try_load_session_changes(path).await.is_err());
    }
}
