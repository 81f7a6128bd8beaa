//! Integration tests for the decode, extract, and track pipeline.

use std::sync::Arc;
use std::time::Duration;

use claude_changes::live::{ChannelSink, LiveChangeTracker};
use claude_changes::session::{
    extract_changes, parse_jsonl_content, ChangeTool, EventType, SessionMetadata,
};

const SESSION: &str = r##"{"type":"user","uuid":"u0","parentUuid":null,"sessionId":"s1","timestamp":"2026-02-01T09:00:00Z","gitBranch":"main","message":{"role":"user","content":"clean up the project"}}
{"type":"file-history-snapshot","messageId":"m0","snapshot":{}}

{"type":"assistant","uuid":"a1","parentUuid":"u0","sessionId":"s1","timestamp":"2026-02-01T09:00:05Z","gitBranch":"main","message":{"role":"assistant","content":[{"type":"thinking","thinking":"plan"},{"type":"tool_use","id":"t1","name":"Edit","input":{"file_path":"/ws/src/lib.rs","old_string":"fn a()","new_string":"fn b()"}}]}}
this line is not json
{"type":"assistant","uuid":"a2","parentUuid":"a1","sessionId":"s1","timestamp":"2026-02-01T09:00:09Z","message":{"role":"assistant","content":[{"type":"tool_use","id":"t2","name":"Write","input":{"file_path":"/ws/NOTES.md","content":"# Notes\n"}},{"type":"tool_use","id":"t3","name":"Read","input":{"file_path":"/ws/Cargo.toml"}}]}}
{"type":"assistant","uuid":"a3","parentUuid":"a2","sessionId":"s1","timestamp":"2026-02-01T09:00:12Z","message":{"role":"assistant","content":[{"type":"tool_use","id":"t4","name":"Bash","input":{"command":"rm -rf \"/ws/tmp\" '/ws/old.log' && cargo build"}}]}}
{"type":"assistant","uuid":"a4","sessionI"##;

const DELAY: Duration = Duration::from_millis(200);

#[test]
fn test_decode_skips_bad_lines_and_keeps_order() {
    let events = parse_jsonl_content(SESSION);

    assert_eq!(events.len(), 5);
    assert_eq!(events[0].event_type, EventType::User);
    assert_eq!(events[1].event_type, EventType::FileHistorySnapshot);
    assert!(events[1].uuid.is_empty());
    assert_eq!(events[4].uuid, "a3");
}

#[test]
fn test_extract_changes_from_session() {
    let events = parse_jsonl_content(SESSION);
    let changes = extract_changes(&events);

    let summary: Vec<_> = changes
        .iter()
        .map(|c| (c.tool(), c.file_path().to_string()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ChangeTool::Edit, "/ws/src/lib.rs".to_string()),
            (ChangeTool::Write, "/ws/NOTES.md".to_string()),
            (ChangeTool::Delete, "/ws/tmp".to_string()),
            (ChangeTool::Delete, "/ws/old.log".to_string()),
        ]
    );

    assert_eq!(changes[0].old_content(), Some("fn a()"));
    assert_eq!(changes[0].new_content(), Some("fn b()"));
    assert_eq!(changes[0].git_branch(), Some("main"));
    assert_eq!(changes[1].old_content(), None);
    assert!(changes[2].is_deleted());
    assert_eq!(changes[2].change_id(), "s1:a3:/ws/tmp");

    // Re-extraction is idempotent.
    assert_eq!(extract_changes(&events), changes);
}

#[test]
fn test_changes_serialize_camel_case() {
    let events = parse_jsonl_content(SESSION);
    let changes = extract_changes(&events);
    let json = serde_json::to_value(&changes[0]).unwrap();

    assert_eq!(json["toolName"], "Edit");
    assert_eq!(json["filePath"], "/ws/src/lib.rs");
    assert_eq!(json["changeId"], "s1:a1:/ws/src/lib.rs");
    assert_eq!(json["isDeleted"], false);
    assert_eq!(json["isHeuristic"], false);
}

#[test]
fn test_session_metadata() {
    let events = parse_jsonl_content(SESSION);
    let metadata = SessionMetadata::from_events(&events);

    assert_eq!(metadata.session_id, "s1");
    assert_eq!(metadata.start_time.as_deref(), Some("2026-02-01T09:00:00Z"));
    assert_eq!(metadata.end_time.as_deref(), Some("2026-02-01T09:00:12Z"));
    assert_eq!(metadata.git_branch.as_deref(), Some("main"));
    assert_eq!(metadata.change_count, 4);
    assert_eq!(metadata.files.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_growing_log_is_delivered_once() {
    let (sink, mut rx) = ChannelSink::new();
    let mut tracker = LiveChangeTracker::new(Arc::new(sink), DELAY);

    // Everything up to the Write is history when the feed starts.
    let head: String = SESSION.lines().take(6).collect::<Vec<_>>().join("\n");
    let history = extract_changes(&parse_jsonl_content(&head));
    assert_eq!(history.len(), 2);
    assert_eq!(tracker.process_changes(&history, true), 2);

    // The log grows; every poll re-extracts from scratch.
    let full = extract_changes(&parse_jsonl_content(SESSION));
    assert_eq!(tracker.process_changes(&full, false), 2);
    assert_eq!(tracker.process_changes(&full, false), 0);

    tokio::time::sleep(DELAY * 2).await;

    let mut delivered = Vec::new();
    while let Ok(change) = rx.try_recv() {
        delivered.push(change.file_path().to_string());
    }
    delivered.sort();
    assert_eq!(delivered, vec!["/ws/old.log", "/ws/tmp"]);
}
