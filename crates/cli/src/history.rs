//! Process-local conversation history.

use async_trait::async_trait;
use lariat_core::{HistoryStore, SessionId};
use tokio::sync::Mutex;

/// Who wrote an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Ai,
}

/// One appended message.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub session: SessionId,
    pub speaker: Speaker,
    pub text: String,
}

/// In-memory history, alive for the duration of one CLI invocation.
#[derive(Default)]
pub struct InMemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn message_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn append_user_message(&self, session: &SessionId, text: &str) -> lariat_core::Result<()> {
        self.entries.lock().await.push(HistoryEntry {
            session: session.clone(),
            speaker: Speaker::User,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn append_ai_message(&self, session: &SessionId, text: &str) -> lariat_core::Result<()> {
        self.entries.lock().await.push(HistoryEntry {
            session: session.clone(),
            speaker: Speaker::Ai,
            text: text.to_string(),
        });
        Ok(())
    }
}
