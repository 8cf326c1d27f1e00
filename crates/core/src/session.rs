//! Session and conversation-continuation types.
//!
//! The backend threads a conversation through three opaque ids returned with
//! every reply. A turn that succeeds commits a fresh triple; a turn that is
//! cancelled commits nothing. The triple is only ever replaced or cleared as
//! a unit.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client-side identifier for one chat session (one loop, one history).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Continuation ids the backend returns with every reply chunk.
///
/// Sending these with the next request keeps the conversation threaded
/// server-side. The triple is all-or-nothing: a request either carries a
/// complete triple or none at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyIds {
    /// Server-side conversation identifier
    pub conversation_id: String,

    /// Identifier of the reply this turn continues from
    pub response_id: String,

    /// Identifier of the chosen reply candidate
    pub choice_id: String,
}

impl ReplyIds {
    pub fn new(
        conversation_id: impl Into<String>,
        response_id: impl Into<String>,
        choice_id: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            response_id: response_id.into(),
            choice_id: choice_id.into(),
        }
    }
}

/// Auth material for one backend session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Per-session request token sent with every call
    pub token: String,

    /// Build label the backend expects as a query parameter
    pub bl: String,
}

impl AuthSession {
    pub fn new(token: impl Into<String>, bl: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            bl: bl.into(),
        }
    }
}

// The token is a credential; keep it out of logs.
impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("bl", &self.bl)
            .finish()
    }
}

/// Everything the client must remember between turns of one conversation.
///
/// Owned by the request coordinator. Succeeding turns replace `ids`
/// atomically; auth failure or an explicit reset clears the whole context;
/// a cancelled turn leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationContext {
    /// Auth for the current backend session, if signed in
    pub auth: Option<AuthSession>,

    /// Continuation triple from the last successful turn, if any
    pub ids: Option<ReplyIds>,
}

impl ConversationContext {
    /// Context with auth but no conversation started yet.
    pub fn signed_in(auth: AuthSession) -> Self {
        Self {
            auth: Some(auth),
            ids: None,
        }
    }

    /// Record the triple from a fully completed turn.
    pub fn commit_ids(&mut self, ids: ReplyIds) {
        self.ids = Some(ids);
    }

    /// Forget the conversation but keep the signed-in session.
    pub fn clear_ids(&mut self) {
        self.ids = None;
    }

    /// Drop everything. Used on auth expiry and explicit reset.
    pub fn clear(&mut self) {
        self.auth = None;
        self.ids = None;
    }
}
