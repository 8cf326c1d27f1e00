//! Prompt request types and the loop budget.

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// A file already uploaded to the backend and attached to a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptFile {
    /// Opaque upload reference the backend handed back for this file
    pub reference: String,

    /// Display name
    pub name: String,

    /// MIME type
    pub mime: String,
}

/// How many tool iterations one prompt may spend.
///
/// The wire convention encodes "no limit" as zero; [`LoopBudget::from_raw`]
/// keeps that behavior while the type makes the unbounded case explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopBudget {
    /// Loop until the model stops requesting tools or the run is cancelled.
    Unbounded,
    /// At most this many completed tool invocations.
    Limited(u32),
}

impl LoopBudget {
    /// Decode the raw setting where `0` means unbounded.
    pub fn from_raw(raw: u32) -> Self {
        if raw == 0 {
            Self::Unbounded
        } else {
            Self::Limited(raw)
        }
    }

    /// May another tool invocation start after `loops_run` completed ones?
    pub fn allows(&self, loops_run: u32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(max) => loops_run < *max,
        }
    }
}

impl Default for LoopBudget {
    fn default() -> Self {
        Self::Limited(10)
    }
}

/// Which remote tools the model may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteToolMode {
    /// Any tool the remote backend exposes.
    #[default]
    All,
    /// Only tools named in the enabled list; anything else is refused before
    /// any backend call is made.
    Selected,
}

/// Everything needed to run one agentic prompt.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    /// The user's prompt text
    pub text: String,

    /// Attached files, already uploaded
    pub files: Vec<PromptFile>,

    /// Named model configuration to route to (empty = backend default)
    pub model: String,

    /// Session this prompt belongs to
    pub session_id: SessionId,

    /// Allow privileged browser-side tools
    pub enable_browser_control: bool,

    /// Allow remote tool-server tools
    pub enable_remote_tools: bool,

    /// Tool iteration budget
    pub loop_budget: LoopBudget,

    /// Remote tool filtering mode
    pub remote_tool_mode: RemoteToolMode,

    /// Allow-list consulted in [`RemoteToolMode::Selected`]
    pub remote_enabled_tools: Vec<String>,
}

impl PromptRequest {
    /// A plain prompt with no tools enabled, in a fresh session.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: Vec::new(),
            model: String::new(),
            session_id: SessionId::new(),
            enable_browser_control: false,
            enable_remote_tools: false,
            loop_budget: LoopBudget::default(),
            remote_tool_mode: RemoteToolMode::All,
            remote_enabled_tools: Vec::new(),
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_files(mut self, files: Vec<PromptFile>) -> Self {
        self.files = files;
        self
    }

    pub fn with_browser_control(mut self, enabled: bool) -> Self {
        self.enable_browser_control = enabled;
        self
    }

    pub fn with_remote_tools(mut self, enabled: bool) -> Self {
        self.enable_remote_tools = enabled;
        self
    }

    pub fn with_loop_budget(mut self, budget: LoopBudget) -> Self {
        self.loop_budget = budget;
        self
    }

    pub fn with_remote_tool_mode(mut self, mode: RemoteToolMode, enabled_tools: Vec<String>) -> Self {
        self.remote_tool_mode = mode;
        self.remote_enabled_tools = enabled_tools;
        self
    }

    /// True when any tool domain is enabled; when false, model output is
    /// always final and tool-call parsing is skipped entirely.
    pub fn tools_enabled(&self) -> bool {
        self.enable_browser_control || self.enable_remote_tools
    }
}

/// Opaque backend routing ids for one model configuration.
///
/// The backend identifies models by a routing id and an entity id it assigns;
/// both change without notice, so they are configuration, never constants.
/// An absent id encodes as null in the request payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// A prompt split into the instruction preamble and the user's text.
///
/// The first dispatch of a run sends `system_instruction` and `user_prompt`
/// joined by a blank line; later iterations send tool observations instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system_instruction: String,
    pub user_prompt: String,
}

impl AssembledPrompt {
    /// The single text block actually sent upstream.
    pub fn flatten(&self) -> String {
        if self.system_instruction.is_empty() {
            return self.user_prompt.clone();
        }
        format!("{}\n\n{}", self.system_instruction, self.user_prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_raw_budget_is_unbounded() {
        assert_eq!(LoopBudget::from_raw(0), LoopBudget::Unbounded);
        assert_eq!(LoopBudget::from_raw(3), LoopBudget::Limited(3));
    }

    #[test]
    fn budget_allows_counts_completed_loops() {
        let budget = LoopBudget::Limited(2);
        assert!(budget.allows(0));
        assert!(budget.allows(1));
        assert!(!budget.allows(2));
        assert!(LoopBudget::Unbounded.allows(u32::MAX - 1));
    }

    #[test]
    fn tools_enabled_when_either_domain_is_on() {
        let req = PromptRequest::new("hi");
        assert!(!req.tools_enabled());
        assert!(req.clone().with_browser_control(true).tools_enabled());
        assert!(req.with_remote_tools(true).tools_enabled());
    }

    #[test]
    fn flatten_joins_instruction_and_prompt() {
        let assembled = AssembledPrompt {
            system_instruction: "Rules.".into(),
            user_prompt: "Question?".into(),
        };
        assert_eq!(assembled.flatten(), "Rules.\n\nQuestion?");

        let bare = AssembledPrompt {
            system_instruction: String::new(),
            user_prompt: "Question?".into(),
        };
        assert_eq!(bare.flatten(), "Question?");
    }
}
