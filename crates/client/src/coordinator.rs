//! Request coordination: conversation state, single-flight discipline, and
//! the two cancellation domains.
//!
//! One coordinator serves one session. It is the sole owner of the
//! conversation context and of the in-flight primary request token: starting
//! a new primary request cancels the previous one, and a superseded request
//! produces no further observer notifications and commits nothing.
//!
//! Internal/utility requests (follow-up generation and the like) run in a
//! separate cancellation domain. The two domains never cross-cancel; only
//! [`RequestCoordinator::reset`] tears both down.

use async_trait::async_trait;
use futures::StreamExt;
use lariat_core::{
    AuthSession, ClientError, ConversationContext, Dispatcher, ReplySnapshot, SnapshotObserver,
    StreamPrompt, TurnReply,
};
use lariat_wire::{StreamDecoder, StreamRequest, WireError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::catalog::ModelCatalog;
use crate::transport::StreamTransport;

pub struct RequestCoordinator {
    transport: Arc<dyn StreamTransport>,
    context: Mutex<ConversationContext>,
    /// Token of the in-flight primary request. Replaced, never shared, on
    /// every new primary dispatch.
    primary: Mutex<CancellationToken>,
    /// Root token of the internal/utility domain. Replaced on reset.
    internal: Mutex<CancellationToken>,
    models: ModelCatalog,
    locale: String,
}

impl RequestCoordinator {
    pub fn new(transport: Arc<dyn StreamTransport>) -> Self {
        Self {
            transport,
            context: Mutex::new(ConversationContext::default()),
            primary: Mutex::new(CancellationToken::new()),
            internal: Mutex::new(CancellationToken::new()),
            models: ModelCatalog::default(),
            locale: "en".into(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_models(mut self, models: ModelCatalog) -> Self {
        self.models = models;
        self
    }

    /// Seed or replace the signed-in session.
    pub async fn set_auth(&self, auth: AuthSession) {
        self.context.lock().await.auth = Some(auth);
    }

    /// Snapshot of the current conversation context.
    pub async fn context(&self) -> ConversationContext {
        self.context.lock().await.clone()
    }

    /// Run the request against the transport and decode the stream.
    ///
    /// Cancellation resolves `Ok(None)`; classification side effects (context
    /// clearing on auth expiry) belong to the caller.
    async fn run_stream(
        &self,
        prompt: StreamPrompt,
        token: &CancellationToken,
        observer: Option<&dyn SnapshotObserver>,
    ) -> Result<Option<TurnReply>, ClientError> {
        let (auth, ids) = {
            let ctx = self.context.lock().await;
            let auth = ctx.auth.clone().ok_or_else(|| {
                ClientError::NotConfigured("no signed-in session; set auth first".into())
            })?;
            (auth, ctx.ids.clone())
        };
        let model = self.models.resolve(&prompt.model)?;

        if token.is_cancelled() {
            return Ok(None);
        }

        let request = StreamRequest::new(prompt.text, &self.locale)
            .with_files(prompt.files)
            .with_ids(ids)
            .with_model(model);

        debug!(request_id = %request.request_id, "Dispatching stream request");

        let mut stream = self.transport.open(&request, &auth).await?;
        let mut decoder = StreamDecoder::new();
        let mut last: Option<ReplySnapshot> = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(request_id = %request.request_id, "Stream request cancelled");
                    return Ok(None);
                }
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let text = chunk?;
            let events = match decoder.push(&text) {
                Ok(events) => events,
                Err(WireError::LoginWall) => return Err(ClientError::AuthExpired),
                Err(other) => return Err(ClientError::Transport(other.to_string())),
            };
            for snapshot in events {
                if token.is_cancelled() {
                    return Ok(None);
                }
                if let Some(observer) = observer {
                    observer.on_snapshot(&snapshot).await;
                }
                last = Some(snapshot);
            }
        }

        let tail = match decoder.finish() {
            Ok(events) => events,
            Err(WireError::LoginWall) => return Err(ClientError::AuthExpired),
            Err(other) => return Err(ClientError::Transport(other.to_string())),
        };
        for snapshot in tail {
            if token.is_cancelled() {
                return Ok(None);
            }
            if let Some(observer) = observer {
                observer.on_snapshot(&snapshot).await;
            }
            last = Some(snapshot);
        }

        if token.is_cancelled() {
            return Ok(None);
        }
        let Some(snapshot) = last else {
            return Err(ClientError::Transport("stream ended without a reply".into()));
        };
        Ok(Some(TurnReply::from(snapshot)))
    }

    /// Apply classification side effects to a failed request.
    async fn note_failure(&self, error: ClientError) -> ClientError {
        if matches!(error, ClientError::AuthExpired) {
            self.context.lock().await.clear();
            warn!("Auth expired; conversation context cleared");
        }
        error
    }
}

#[async_trait]
impl Dispatcher for RequestCoordinator {
    async fn dispatch(
        &self,
        prompt: StreamPrompt,
        cancel: &CancellationToken,
        observer: &dyn SnapshotObserver,
    ) -> Result<Option<TurnReply>, ClientError> {
        // Single-flight: supersede whatever is in the slot before issuing.
        let request_token = cancel.child_token();
        {
            let mut slot = self.primary.lock().await;
            slot.cancel();
            *slot = request_token.clone();
        }

        match self.run_stream(prompt, &request_token, Some(observer)).await {
            Ok(Some(reply)) => {
                if request_token.is_cancelled() {
                    return Ok(None);
                }
                self.context.lock().await.commit_ids(reply.ids.clone());
                Ok(Some(reply))
            }
            Ok(None) => Ok(None),
            Err(error) => Err(self.note_failure(error).await),
        }
    }

    async fn dispatch_internal(
        &self,
        prompt: StreamPrompt,
    ) -> Result<Option<TurnReply>, ClientError> {
        let token = self.internal.lock().await.child_token();
        // Utility generations read the context but never advance it.
        match self.run_stream(prompt, &token, None).await {
            Ok(reply) => Ok(reply),
            Err(error) => Err(self.note_failure(error).await),
        }
    }

    async fn new_conversation(&self) {
        self.context.lock().await.clear_ids();
        debug!("Continuation ids cleared; next dispatch starts a fresh conversation");
    }

    async fn reset(&self) {
        self.primary.lock().await.cancel();
        {
            let mut internal = self.internal.lock().await;
            internal.cancel();
            *internal = CancellationToken::new();
        }
        self.context.lock().await.clear();
        debug!("Coordinator reset; both request domains cancelled");
    }
}
