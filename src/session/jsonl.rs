//! JSONL decoder for Claude Code session logs.
//!
//! Decodes `~/.claude/projects/<hash>/*.jsonl` lines into [`SessionEvent`]s.

use serde::Deserialize;

use super::error::DecodeError;

/// Kind of a session log line, read from its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EventType {
    /// User message or tool result.
    #[serde(rename = "user")]
    User,
    /// Assistant response, the only kind that carries tool uses.
    #[serde(rename = "assistant")]
    Assistant,
    /// Queued user message.
    #[serde(rename = "user_message")]
    UserMessage,
    /// File backup snapshot.
    #[serde(rename = "file-history-snapshot")]
    FileHistorySnapshot,
    /// Any other line type (summary, system, progress, ...).
    #[serde(other)]
    Other,
}

/// A single decoded line of a session log.
///
/// Fields that some line types omit decode to empty values. Everything the
/// decoder does not interpret is kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub parent_uuid: Option<String>,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub tool_use_result: Option<serde_json::Value>,
    /// Unknown fields, preserved but never interpreted.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionEvent {
    /// Content items of the message, empty if there is none.
    #[must_use]
    pub fn content_blocks(&self) -> &[ContentBlock] {
        match self.message.as_ref().map(|m| &m.content) {
            Some(MessageContent::Blocks(blocks)) => blocks,
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.event_type == EventType::Assistant
    }
}

/// A message with role and content.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default)]
    pub model: Option<String>,
}

/// Message content - can be plain text or structured blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Blocks(Vec::new())
    }
}

/// A content block within a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },
    /// Tool use request
    ToolUse {
        #[serde(default)]
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Tool result
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
    },
    /// Thinking block
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    /// Unknown block type
    #[serde(other)]
    Unknown,
}

impl MessageContent {
    /// Get the text content as a string.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Decode one log line.
///
/// # Errors
///
/// Returns [`DecodeError::Blank`] for whitespace-only lines and
/// [`DecodeError::Malformed`] when the line is not a JSON object of the
/// expected shape.
pub fn decode_line(line: &str) -> Result<SessionEvent, DecodeError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Blank);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Parse JSONL content into session events.
///
/// Skips blank and malformed lines. A failure on the final line is expected
/// while the assistant is still appending to it.
#[must_use]
pub fn parse_jsonl_content(content: &str) -> Vec<SessionEvent> {
    let lines: Vec<&str> = content.lines().collect();
    let last = lines.len().saturating_sub(1);

    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| match decode_line(line) {
            Ok(event) => Some(event),
            Err(DecodeError::Blank) => None,
            Err(e) if idx == last => {
                tracing::trace!(error = %e, "Skipping partial trailing JSONL line");
                None
            }
            Err(e) => {
                tracing::debug!(line = idx + 1, error = %e, "Skipping malformed JSONL line");
                None
            }
        })
        .collect()
}
