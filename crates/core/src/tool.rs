//! Tool invocation and result types.
//!
//! A tool invocation is whatever the model asked for, verbatim. A tool
//! result is always produced, success or failure: execution errors become
//! observation text so the loop can keep going.

use serde::{Deserialize, Serialize};

/// A tool invocation parsed from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool name exactly as the model wrote it
    #[serde(rename = "tool")]
    pub name: String,

    /// Arguments object; `{}` when the block omitted `args`
    #[serde(default = "empty_args")]
    pub args: serde_json::Value,
}

fn empty_args() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Which domain actually served a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    /// Privileged browser-side capability
    Local,
    /// Remote tool server
    Remote,
    /// The invocation never reached a backend (unknown name, policy refusal)
    Unknown,
}

/// A file produced by a tool, surfaced to the notification sink only.
///
/// File payloads never re-enter the text context sent back to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFile {
    /// Base64-encoded contents
    pub data: String,

    /// MIME type
    pub mime: String,

    /// Display name
    pub name: String,
}

/// The outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was (or was refused to be) executed
    pub tool_name: String,

    /// Observation text fed back to the model. Failures read
    /// `Error executing tool: <message>`.
    pub output: String,

    /// Binary artifacts (screenshots), for the sink only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<ToolFile>,

    /// Domain that served the invocation
    pub source: ToolSource,
}

impl ToolResult {
    pub fn success(
        tool_name: impl Into<String>,
        output: impl Into<String>,
        source: ToolSource,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: output.into(),
            files: Vec::new(),
            source,
        }
    }

    /// A failure rendered as observation text. The loop treats this like any
    /// other result.
    pub fn failure(
        tool_name: impl Into<String>,
        message: impl std::fmt::Display,
        source: ToolSource,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: format!("Error executing tool: {message}"),
            files: Vec::new(),
            source,
        }
    }

    pub fn with_files(mut self, files: Vec<ToolFile>) -> Self {
        self.files = files;
        self
    }

    /// True when this result carries the failure marker.
    pub fn is_error(&self) -> bool {
        self.output.starts_with("Error executing tool:")
    }
}

/// Raw output of a privileged browser-side capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalToolOutput {
    /// Textual observation
    pub text: String,

    /// Captured image, for capture capabilities
    pub image: Option<ImagePayload>,
}

impl LocalToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }
}

/// An image captured by a browser capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Base64-encoded image bytes
    pub data: String,

    /// MIME type, e.g. `image/png`
    pub mime: String,
}
