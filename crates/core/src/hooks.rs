//! Embedder-facing collaborator traits.
//!
//! The agent loop is written against these seams; hosts plug in their own
//! chat surface, history persistence, and prompt framing.

use async_trait::async_trait;

use crate::error::Result;
use crate::prompt::{AssembledPrompt, PromptRequest};
use crate::session::SessionId;

/// Terminal state of one agentic run.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopOutcome {
    /// The model produced a final answer.
    Done { text: String, loops_run: u32 },

    /// The run stopped on a classified error. History may already contain
    /// the iterations that completed before the failure.
    Failed { error: String, loops_run: u32 },

    /// The run was cancelled. Reported through the loop handle only; the
    /// notification sink is never called for a cancelled run.
    Cancelled,
}

impl LoopOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

/// Builds the first prompt of a run from the user's request.
///
/// Later iterations bypass the assembler: they send tool observations in a
/// fixed framing owned by the loop.
pub trait PromptAssembler: Send + Sync {
    fn assemble(&self, request: &PromptRequest) -> AssembledPrompt;
}

/// Append-only conversation history.
///
/// The loop appends the user's message and the model's reply once per
/// iteration, after the reply completed. Cancelled iterations append
/// nothing. Failures here are logged and do not stop the run.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_user_message(&self, session: &SessionId, text: &str) -> Result<()>;

    async fn append_ai_message(&self, session: &SessionId, text: &str) -> Result<()>;
}

/// Where the run reports progress.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Cumulative partial text, forwarded in decode order. The final call
    /// for a turn always carries the consolidated text.
    async fn on_partial_update(&self, text: &str, thoughts: Option<&str>);

    /// Exactly once per completed (not cancelled) run.
    async fn on_turn_done(&self, outcome: &LoopOutcome);

    /// Suggested follow-up prompts, delivered some time after the run ends.
    async fn on_follow_ups(&self, _suggestions: Vec<String>) {}
}

/// Detached work kicked off after a run finishes (follow-up suggestions,
/// titling). Runs fire-and-forget; completion of the run never waits on it.
#[async_trait]
pub trait TurnPostProcessor: Send + Sync {
    async fn after_turn(&self, session: &SessionId, final_text: &str);
}
