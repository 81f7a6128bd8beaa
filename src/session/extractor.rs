//! Change extraction.
//!
//! Walks decoded session events in file order and derives the file changes
//! requested by `Edit`, `Write` and `Bash rm` tool calls.

use std::sync::OnceLock;

use regex::Regex;

use super::change::{ChangeKind, FileChange};
use super::jsonl::{ContentBlock, SessionEvent};
use super::tool::ToolInvocation;

/// Matches each `rm` invocation and captures its arguments up to the next
/// shell separator.
fn rm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\brm\s+([^;&|\n]+)").expect("rm pattern is valid"))
}

/// Paths removed by `rm` invocations in a shell command.
///
/// Flag tokens (starting with `-`) are dropped; surrounding quotes are
/// stripped. Redirections and their targets are skipped, and a `#` token
/// ends the arguments. A command without `rm` yields nothing.
#[must_use]
pub fn parse_rm_targets(command: &str) -> Vec<String> {
    rm_pattern()
        .captures_iter(command)
        .filter_map(|caps| caps.get(1))
        .flat_map(|args| rm_arguments(args.as_str()))
        .collect()
}

fn rm_arguments(args: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let mut tokens = args.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.starts_with('#') {
            break;
        }
        if let Some(at) = token.find(is_redirect) {
            // `2>log` carries its target, a bare `>` takes the next token.
            if token[at..]
                .trim_start_matches(|c| is_redirect(c) || c == '&')
                .is_empty()
            {
                tokens.next();
            }
            continue;
        }
        if token.starts_with('-') {
            continue;
        }
        let path = strip_quotes(token);
        if !path.is_empty() {
            targets.push(path.to_string());
        }
    }
    targets
}

fn is_redirect(c: char) -> bool {
    c == '<' || c == '>'
}

fn strip_quotes(token: &str) -> &str {
    let token = token.trim_matches(|c| c == '"' || c == '\'');
    token.trim()
}

/// Derives file changes from session events.
///
/// Keeps the records of every processed event in input order; it never
/// reorders by timestamp.
#[derive(Debug, Default)]
pub struct ChangeExtractor {
    changes: Vec<FileChange>,
}

impl ChangeExtractor {
    /// Create a new empty extractor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single event, appending any changes it carries.
    ///
    /// Returns the number of records produced.
    pub fn process_event(&mut self, event: &SessionEvent) -> usize {
        if !event.is_assistant() {
            return 0;
        }

        let before = self.changes.len();
        for block in event.content_blocks() {
            if let ContentBlock::ToolUse { name, input, .. } = block {
                let tool = ToolInvocation::from_tool_use(name, input);
                self.process_tool(event, tool);
            }
        }
        self.changes.len() - before
    }

    /// Process multiple events in order.
    pub fn process_events<'a>(&mut self, events: impl IntoIterator<Item = &'a SessionEvent>) {
        for event in events {
            self.process_event(event);
        }
    }

    /// Get all changes extracted so far.
    #[must_use]
    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    #[must_use]
    pub fn into_changes(self) -> Vec<FileChange> {
        self.changes
    }

    /// Clear all state, resetting the extractor.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    fn process_tool(&mut self, event: &SessionEvent, tool: ToolInvocation) {
        match tool {
            ToolInvocation::Edit(input) => {
                let Some(path) = non_empty(input.file_path) else {
                    tracing::trace!(uuid = %event.uuid, "Edit without file_path, skipping");
                    return;
                };
                let kind = ChangeKind::Edit {
                    old: input.old_string.unwrap_or_default(),
                    new: input.new_string.unwrap_or_default(),
                };
                self.push(event, path, kind);
            }
            ToolInvocation::Write(input) => {
                let Some(path) = non_empty(input.file_path) else {
                    tracing::trace!(uuid = %event.uuid, "Write without file_path, skipping");
                    return;
                };
                let kind = ChangeKind::Write {
                    new: input.content.unwrap_or_default(),
                };
                self.push(event, path, kind);
            }
            ToolInvocation::Bash(input) => {
                for path in parse_rm_targets(&input.command) {
                    self.push(event, path, ChangeKind::Delete);
                }
            }
            ToolInvocation::Other(_) => {}
        }
    }

    fn push(&mut self, event: &SessionEvent, path: String, kind: ChangeKind) {
        let change = FileChange::new(event.session_id.clone(), event.uuid.clone(), path, kind)
            .with_timestamp(event.timestamp.clone())
            .with_git_branch(event.git_branch.clone())
            .with_parent_uuid(event.parent_uuid.clone());
        self.changes.push(change);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Extract file changes from an ordered sequence of events.
#[must_use]
pub fn extract_changes<'a>(events: impl IntoIterator<Item = &'a SessionEvent>) -> Vec<FileChange> {
    let mut extractor = ChangeExtractor::new();
    extractor.process_events(events);
    extractor.into_changes()
}
