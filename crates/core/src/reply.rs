//! Reply types produced by the streaming decoder.

use serde::{Deserialize, Serialize};

use crate::session::ReplyIds;

/// A cumulative view of the model's reply at some point in the stream.
///
/// Each snapshot carries the **full** text generated so far; a later snapshot
/// replaces an earlier one outright. Consumers must never concatenate
/// snapshot texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplySnapshot {
    /// Complete reply text so far
    pub text: String,

    /// Model reasoning summary, when the backend exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,

    /// Continuation ids observed in this chunk
    pub ids: ReplyIds,
}

/// The consolidated result of one completed (uncancelled) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReply {
    /// Final reply text
    pub text: String,

    /// Final reasoning summary, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,

    /// Ids to thread the next turn with
    pub ids: ReplyIds,
}

impl From<ReplySnapshot> for TurnReply {
    fn from(snapshot: ReplySnapshot) -> Self {
        Self {
            text: snapshot.text,
            thoughts: snapshot.thoughts,
            ids: snapshot.ids,
        }
    }
}
