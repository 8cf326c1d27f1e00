//! Dispatcher trait: the seam between the agent loop and the streaming
//! client.
//!
//! A Dispatcher owns the conversation context and the in-flight request
//! lifecycle. The agent loop hands it prompt text and an observer; it gets
//! back either the consolidated reply, `None` when the request was cancelled
//! or superseded, or a classified error.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::prompt::PromptFile;
use crate::reply::{ReplySnapshot, TurnReply};

/// One outbound request for the streaming backend.
#[derive(Debug, Clone, Default)]
pub struct StreamPrompt {
    /// Text block to send (already assembled)
    pub text: String,

    /// Attached files
    pub files: Vec<PromptFile>,

    /// Named model configuration (empty = default)
    pub model: String,
}

impl StreamPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: Vec::new(),
            model: String::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_files(mut self, files: Vec<PromptFile>) -> Self {
        self.files = files;
        self
    }
}

/// Receives decoded snapshots while a request streams.
///
/// Called in decode order; a cancelled or superseded request stops receiving
/// callbacks immediately, even if late bytes are still decoded.
#[async_trait]
pub trait SnapshotObserver: Send + Sync {
    async fn on_snapshot(&self, snapshot: &ReplySnapshot);
}

/// The streaming-client seam.
///
/// Two request domains share one conversation context:
/// - the **primary** domain carries user turns and is single-flight: a new
///   dispatch supersedes any in-flight one;
/// - the **internal** domain carries utility generations (follow-up
///   suggestions) and never interferes with the primary domain.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Run a primary-domain request.
    ///
    /// `cancel` belongs to the caller; the dispatcher also cancels the
    /// request when a newer primary dispatch arrives. Either way the call
    /// resolves `Ok(None)`, commits nothing, and the observer goes silent.
    async fn dispatch(
        &self,
        prompt: StreamPrompt,
        cancel: &CancellationToken,
        observer: &dyn SnapshotObserver,
    ) -> std::result::Result<Option<TurnReply>, ClientError>;

    /// Run an internal-domain request. No observer: utility generations are
    /// consumed whole.
    async fn dispatch_internal(
        &self,
        prompt: StreamPrompt,
    ) -> std::result::Result<Option<TurnReply>, ClientError>;

    /// Forget the current conversation thread but stay signed in.
    async fn new_conversation(&self);

    /// Drop the whole conversation context, auth included, and cancel
    /// anything in flight on either domain.
    async fn reset(&self);
}
