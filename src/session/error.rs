//! Session log error types.

/// Errors produced while decoding a single log line.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The line holds only whitespace.
    #[error("Blank line")]
    Blank,

    /// The line is not a JSON object of the expected shape.
    #[error("Malformed JSONL line: {0}")]
    Malformed(#[from] serde_json::Error),
}
