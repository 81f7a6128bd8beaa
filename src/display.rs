//! Colored CLI display utilities for change output.
//!
//! This module provides functions for printing change records, session
//! listings and summaries to the terminal.

use std::io::{self, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use owo_colors::OwoColorize;

use crate::live::{ChangeSink, SinkError};
use crate::session::{ChangeTool, FileChange, SessionMetadata};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum number of characters, adding ellipsis if
/// truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// One-line preview of file content.
#[must_use]
pub fn content_preview(content: &str, raw_mode: bool) -> String {
    let first = content.lines().next().unwrap_or_default().trim();
    let lines = content.lines().count();
    let preview = truncate(first, DEFAULT_MAX_LEN, raw_mode);
    if lines > 1 {
        format!("{preview} (+{} lines)", lines - 1)
    } else {
        preview
    }
}

/// Plain-text summary of a change, without colors.
#[must_use]
pub fn describe_change(change: &FileChange) -> String {
    match (change.tool(), change.old_content(), change.new_content()) {
        (ChangeTool::Delete, _, _) => "deleted".to_string(),
        (ChangeTool::Edit, Some(old), Some(new)) => format!(
            "-{} +{} lines",
            old.lines().count(),
            new.lines().count()
        ),
        (_, _, Some(new)) => format!("{} lines", new.lines().count()),
        _ => String::new(),
    }
}

fn tool_label(tool: ChangeTool) -> String {
    let label = format!("[{tool}]");
    match tool {
        ChangeTool::Edit => label.yellow().bold().to_string(),
        ChangeTool::Write => label.green().bold().to_string(),
        ChangeTool::Delete => label.red().bold().to_string(),
        ChangeTool::Heuristic => label.magenta().bold().to_string(),
    }
}

/// Print one change record of a session listing.
pub fn print_change(change: &FileChange, raw_mode: bool) {
    println!(
        "{} {} {} {}",
        change.timestamp().dimmed(),
        tool_label(change.tool()),
        change.file_path(),
        describe_change(change).dimmed()
    );
    if !raw_mode {
        if let Some(new) = change.new_content().filter(|s| !s.is_empty()) {
            println!("    {}", content_preview(new, raw_mode).dimmed());
        }
    }
    let _ = io::stdout().flush();
}

/// Print a change surfaced by the live feed or heuristic detector.
pub fn print_live_change(change: &FileChange) {
    println!(
        "{} {} {} {}",
        timestamp().dimmed(),
        tool_label(change.tool()),
        change.file_path().bold(),
        describe_change(change).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print session log paths, newest first.
pub fn print_sessions(sessions: &[PathBuf]) {
    if sessions.is_empty() {
        println!("{}", "No sessions found".dimmed());
        return;
    }
    for (index, session) in sessions.iter().enumerate() {
        let path = session.as_path();
        let id = path
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        let marker = if index == 0 { "*" } else { " " };
        println!(
            "{} {} {}",
            marker.green().bold(),
            id.cyan(),
            path.display().dimmed()
        );
    }
    let _ = io::stdout().flush();
}

/// Print session metadata.
pub fn print_summary(metadata: &SessionMetadata) {
    println!("{} {}", "[SESSION]".blue().bold(), metadata.session_id.cyan());
    if let Some(branch) = &metadata.git_branch {
        println!("  branch:  {branch}");
    }
    if let Some(start) = &metadata.start_time {
        println!("  started: {start}");
    }
    if let Some(end) = &metadata.end_time {
        println!("  ended:   {end}");
    }
    println!(
        "  changes: {} across {} files",
        metadata.change_count,
        metadata.files.len()
    );
    for file in &metadata.files {
        println!("    {}", file.dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stdout().flush();
}

/// Sink that prints every delivered change to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

#[async_trait]
impl ChangeSink for TerminalSink {
    async fn deliver(&self, change: &FileChange) -> Result<(), SinkError> {
        print_live_change(change);
        Ok(())
    }

    fn on_delivery_failed(&self, change: &FileChange, error: &SinkError) {
        print_error(&format!("{}: {error}", change.file_path()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ChangeKind;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10, false), "hello");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate("hello", 5, false), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8, false), "hello...");
    }

    #[test]
    fn test_truncate_very_short_max() {
        assert_eq!(truncate("hello", 3, false), "...");
        assert_eq!(truncate("hello", 0, false), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("héllo wörld", 8, false), "héllo...");
    }

    #[test]
    fn test_truncate_raw_mode_no_truncation() {
        let long_string = "a".repeat(200);
        assert_eq!(truncate(&long_string, 10, true), long_string);
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("one line", false), "one line");
        assert_eq!(content_preview("  first\nsecond\nthird", false), "first (+2 lines)");
        assert_eq!(content_preview("", false), "");
    }

    #[test]
    fn test_describe_change() {
        let edit = FileChange::new(
            "s",
            "m",
            "/a",
            ChangeKind::Edit {
                old: "a\nb".to_string(),
                new: "c".to_string(),
            },
        );
        assert_eq!(describe_change(&edit), "-2 +1 lines");

        let write = FileChange::new(
            "s",
            "m",
            "/a",
            ChangeKind::Write {
                new: "x\ny\nz".to_string(),
            },
        );
        assert_eq!(describe_change(&write), "3 lines");

        let delete = FileChange::new("s", "m", "/a", ChangeKind::Delete);
        assert_eq!(describe_change(&delete), "deleted");

        let heuristic = FileChange::heuristic("/a", "x");
        assert_eq!(describe_change(&heuristic), "1 lines");
    }

    #[tokio::test]
    async fn test_terminal_sink_accepts_changes() {
        let sink = TerminalSink;
        let change = FileChange::heuristic("/a", "x");
        assert!(sink.deliver(&change).await.is_ok());
    }
}
