//! Single ownership of runs, per session.

use std::collections::HashMap;
use std::sync::Arc;

use lariat_core::{NotificationSink, PromptRequest, SessionId};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::loop_runner::{AgentLoop, LoopHandle};

/// Enforces at most one live run per session.
///
/// A new prompt for a session first cancels whatever run that session still
/// has in flight, then starts the replacement. Distinct sessions never
/// affect each other.
pub struct LoopRegistry {
    agent: Arc<AgentLoop>,
    active: Mutex<HashMap<SessionId, CancellationToken>>,
}

impl LoopRegistry {
    pub fn new(agent: Arc<AgentLoop>) -> Self {
        Self {
            agent,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Start a run for the request's session, superseding any prior one.
    pub async fn start(
        &self,
        request: PromptRequest,
        sink: Arc<dyn NotificationSink>,
    ) -> LoopHandle {
        let token = CancellationToken::new();
        {
            let mut active = self.active.lock().await;
            if let Some(prior) = active.insert(request.session_id.clone(), token.clone()) {
                debug!(session = %request.session_id, "Superseding the session's active run");
                prior.cancel();
            }
        }
        self.agent.start_with_token(request, sink, token)
    }

    /// Cancel the session's active run, if any.
    pub async fn cancel(&self, session: &SessionId) {
        if let Some(token) = self.active.lock().await.remove(session) {
            debug!(session = %session, "Cancelling the session's active run");
            token.cancel();
        }
    }

    /// Cancel every active run.
    pub async fn cancel_all(&self) {
        let mut active = self.active.lock().await;
        for (session, token) in active.drain() {
            debug!(session = %session, "Cancelling the session's active run");
            token.cancel();
        }
    }
}
