//! The turn orchestration loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lariat_core::{
    Capability, Dispatcher, HistoryStore, LoopOutcome, NotificationSink, PromptAssembler,
    PromptRequest, ReplySnapshot, SessionId, SnapshotObserver, StreamPrompt, ToolInvocation,
    ToolResult, TurnPostProcessor,
};
use lariat_tools::{ToolAccess, ToolInvoker};
use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assembler::ProtocolAssembler;
use crate::tool_call::parse_tool_call;

/// Delay window between tool iterations. The pause spaces requests out so a
/// busy run does not trip upstream throttling.
#[derive(Debug, Clone, Copy)]
struct BackoffWindow {
    min: Duration,
    max: Duration,
}

impl BackoffWindow {
    fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let span_ms = (self.max - self.min).as_millis() as u64;
        self.min + Duration::from_millis(rand::thread_rng().gen_range(0..=span_ms))
    }
}

impl Default for BackoffWindow {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(2000),
            max: Duration::from_millis(4000),
        }
    }
}

/// The core loop that alternates model turns and tool execution.
pub struct AgentLoop {
    /// Streaming backend seam
    dispatcher: Arc<dyn Dispatcher>,

    /// Executes whatever tools the model requests
    invoker: Arc<ToolInvoker>,

    /// Conversation persistence
    history: Arc<dyn HistoryStore>,

    /// Builds the first prompt of a run
    assembler: Arc<dyn PromptAssembler>,

    /// Detached work after a completed run
    post_processor: Option<Arc<dyn TurnPostProcessor>>,

    /// Inter-iteration delay window
    backoff: BackoffWindow,
}

impl AgentLoop {
    /// Create a loop with the default prompt assembler and backoff window.
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        invoker: Arc<ToolInvoker>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            dispatcher,
            invoker,
            history,
            assembler: Arc::new(ProtocolAssembler::new()),
            post_processor: None,
            backoff: BackoffWindow::default(),
        }
    }

    /// Replace the prompt assembler.
    pub fn with_assembler(mut self, assembler: Arc<dyn PromptAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    /// Attach post-processing that runs detached after each completed run.
    pub fn with_post_processor(mut self, processor: Arc<dyn TurnPostProcessor>) -> Self {
        self.post_processor = Some(processor);
        self
    }

    /// Set the inter-iteration backoff window.
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.backoff = BackoffWindow { min, max };
        self
    }

    /// Spawn a run on the current runtime.
    ///
    /// The returned handle cancels or joins the run; dropping it detaches
    /// the run instead.
    pub fn start(
        self: &Arc<Self>,
        request: PromptRequest,
        sink: Arc<dyn NotificationSink>,
    ) -> LoopHandle {
        self.start_with_token(request, sink, CancellationToken::new())
    }

    /// Spawn a run driven by a caller-owned cancellation token. The loop
    /// registry uses this to supersede a prior run for the same session.
    pub fn start_with_token(
        self: &Arc<Self>,
        request: PromptRequest,
        sink: Arc<dyn NotificationSink>,
        cancel: CancellationToken,
    ) -> LoopHandle {
        let agent = Arc::clone(self);
        let task_cancel = cancel.clone();
        let task =
            tokio::spawn(async move { agent.run(&request, sink.as_ref(), &task_cancel).await });
        LoopHandle { cancel, task }
    }

    /// Run one agentic prompt to a terminal state.
    ///
    /// Each iteration dispatches the current prompt, persists the exchange,
    /// and either finishes or executes the requested tool and goes around
    /// again. Cancellation is checked at the top of every iteration, inside
    /// the dispatcher, and during the backoff pause; a cancelled run makes
    /// no further history writes and never calls the sink again.
    pub async fn run(
        &self,
        request: &PromptRequest,
        sink: &dyn NotificationSink,
        cancel: &CancellationToken,
    ) -> LoopOutcome {
        info!(
            session = %request.session_id,
            tools = request.tools_enabled(),
            "Starting agentic run"
        );

        let access = ToolAccess::from_request(request);
        let mut wire_text = self.assembler.assemble(request).flatten();
        let mut history_text = request.text.clone();
        let mut files = request.files.clone();
        let mut loops_run: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(session = %request.session_id, "Run cancelled");
                return LoopOutcome::Cancelled;
            }

            let prompt = StreamPrompt::new(wire_text.clone())
                .with_model(request.model.clone())
                .with_files(std::mem::take(&mut files));
            let observer = SinkObserver { sink };
            let reply = match self.dispatcher.dispatch(prompt, cancel, &observer).await {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    debug!(session = %request.session_id, "Run cancelled in flight");
                    return LoopOutcome::Cancelled;
                }
                Err(error) => {
                    warn!(session = %request.session_id, error = %error, "Dispatch failed");
                    let outcome = LoopOutcome::Failed {
                        error: error.to_string(),
                        loops_run,
                    };
                    sink.on_turn_done(&outcome).await;
                    return outcome;
                }
            };

            self.persist_exchange(&request.session_id, &history_text, &reply.text)
                .await;

            // Without tools the reply is final by construction; the parser
            // never runs.
            if !request.tools_enabled() {
                return self.finalize(request, sink, reply.text, loops_run).await;
            }

            let Some(invocation) = parse_tool_call(&reply.text) else {
                return self.finalize(request, sink, reply.text, loops_run).await;
            };
            if !request.loop_budget.allows(loops_run) {
                info!(
                    session = %request.session_id,
                    loops_run,
                    "Loop budget exhausted; treating the reply as final"
                );
                return self.finalize(request, sink, reply.text, loops_run).await;
            }

            debug!(session = %request.session_id, tool = %invocation.name, "Model requested a tool");
            let result = self.invoker.execute(&invocation, &access).await;
            loops_run += 1;

            wire_text = self.tool_output_prompt(request, &invocation, &result).await;
            history_text = wire_text.clone();

            let delay = self.backoff.sample();
            debug!(delay_ms = delay.as_millis() as u64, "Pausing before the next iteration");
            tokio::select! {
                _ = cancel.cancelled() => return LoopOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Persist one completed exchange. Failures are logged and swallowed; a
    /// broken history store must not kill a run in progress.
    async fn persist_exchange(&self, session: &SessionId, user_text: &str, ai_text: &str) {
        if let Err(error) = self.history.append_user_message(session, user_text).await {
            warn!(session = %session, error = %error, "Failed to persist the user message");
        }
        if let Err(error) = self.history.append_ai_message(session, ai_text).await {
            warn!(session = %session, error = %error, "Failed to persist the model reply");
        }
    }

    async fn finalize(
        &self,
        request: &PromptRequest,
        sink: &dyn NotificationSink,
        text: String,
        loops_run: u32,
    ) -> LoopOutcome {
        info!(session = %request.session_id, loops_run, "Run complete");
        let outcome = LoopOutcome::Done { text, loops_run };
        sink.on_turn_done(&outcome).await;

        if let Some(processor) = &self.post_processor {
            let processor = Arc::clone(processor);
            let session = request.session_id.clone();
            let final_text = match &outcome {
                LoopOutcome::Done { text, .. } => text.clone(),
                _ => String::new(),
            };
            tokio::spawn(async move {
                processor.after_turn(&session, &final_text).await;
            });
        }
        outcome
    }

    /// Build the next prompt from a tool observation. A mutating tool leaves
    /// the page changed, so a fresh snapshot is appended to re-ground the
    /// model; read-only tools skip it.
    async fn tool_output_prompt(
        &self,
        request: &PromptRequest,
        invocation: &ToolInvocation,
        result: &ToolResult,
    ) -> String {
        let mut prompt = format!("Tool result for \"{}\":\n{}", result.tool_name, result.output);

        let mutating = Capability::from_name(&invocation.name)
            .map(|capability| !capability.is_read_only())
            .unwrap_or(true);
        if mutating && request.enable_browser_control {
            let snapshot = self
                .invoker
                .execute(
                    &ToolInvocation::new(
                        Capability::TakeSnapshot.as_str(),
                        serde_json::json!({}),
                    ),
                    &ToolAccess::unrestricted(),
                )
                .await;
            if snapshot.is_error() {
                debug!(
                    session = %request.session_id,
                    "Post-tool snapshot failed; continuing without it"
                );
            } else {
                prompt.push_str("\n\nCurrent page snapshot:\n");
                prompt.push_str(&snapshot.output);
            }
        }
        prompt
    }
}

/// Handle to a spawned run.
pub struct LoopHandle {
    cancel: CancellationToken,
    task: JoinHandle<LoopOutcome>,
}

impl LoopHandle {
    /// Signal cooperative cancellation. The run stops at its next check; a
    /// tool side effect already issued is not undone.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the run has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run's terminal outcome.
    pub async fn join(self) -> LoopOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(error) => LoopOutcome::Failed {
                error: format!("Run task failed: {error}"),
                loops_run: 0,
            },
        }
    }
}

/// Forwards decoded snapshots to the run's notification sink.
struct SinkObserver<'a> {
    sink: &'a dyn NotificationSink,
}

#[async_trait]
impl SnapshotObserver for SinkObserver<'_> {
    async fn on_snapshot(&self, snapshot: &ReplySnapshot) {
        self.sink
            .on_partial_update(&snapshot.text, snapshot.thoughts.as_deref())
            .await;
    }
}
