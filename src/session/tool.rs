//! Typed tool-use payloads.
//!
//! A `tool_use` block carries a tool name and a free-form JSON input. The
//! tools that can mutate files are decoded into dedicated variants here; the
//! name is the discriminant.

use serde::Deserialize;

/// Input of an `Edit` tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EditInput {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub old_string: Option<String>,
    #[serde(default)]
    pub new_string: Option<String>,
}

/// Input of a `Write` tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WriteInput {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Input of a `Bash` tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BashInput {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A tool call, discriminated by tool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    Edit(EditInput),
    Write(WriteInput),
    Bash(BashInput),
    /// Any other tool, or a known tool whose input has the wrong shape.
    Other(String),
}

impl ToolInvocation {
    /// Decode a tool call from its name and raw input.
    #[must_use]
    pub fn from_tool_use(name: &str, input: &serde_json::Value) -> Self {
        let decoded = match name {
            "Edit" => serde_json::from_value(input.clone()).map(Self::Edit),
            "Write" => serde_json::from_value(input.clone()).map(Self::Write),
            "Bash" => serde_json::from_value(input.clone()).map(Self::Bash),
            _ => return Self::Other(name.to_string()),
        };

        decoded.unwrap_or_else(|e| {
            tracing::debug!(tool = name, error = %e, "Tool input has unexpected shape");
            Self::Other(name.to_string())
        })
    }

    /// Name of the tool.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Edit(_) => "Edit",
            Self::Write(_) => "Write",
            Self::Bash(_) => "Bash",
            Self::Other(name) => name,
        }
    }
}
