//! End-to-end tests of the assembled client stack: HTTP transport, request
//! coordinator, tool invoker, and agent loop against a mock backend.
//!
//! These exercise the same wiring the CLI builds from configuration, with a
//! scripted browser backend standing in for a real host surface.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lariat_agent::{AgentLoop, FollowUpSuggester, LoopRegistry};
use lariat_client::{HttpTransport, RequestCoordinator};
use lariat_core::{
    AuthSession, BrowserBackend, Capability, HistoryStore, LocalToolOutput, LoopOutcome,
    NotificationSink, PromptRequest, SessionId, ToolError,
};
use lariat_tools::ToolInvoker;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Wire helpers ─────────────────────────────────────────────────────────

fn reply_line(cid: &str, rid: &str, rcid: &str, text: &str) -> String {
    let mut body = vec![Value::Null; 5];
    body[1] = json!([cid, rid]);
    body[4] = json!([[rcid, [text]]]);
    let payload = serde_json::to_string(&Value::Array(body)).unwrap();
    let mut line = serde_json::to_string(&json!([["wrb.fr", null, payload]])).unwrap();
    line.push('\n');
    line
}

fn stream_body(lines: &[String]) -> String {
    let mut body = String::from(")]}'\n\n");
    for line in lines {
        body.push_str(line);
    }
    body
}

// ── Test doubles ─────────────────────────────────────────────────────────

/// Records every sink callback for later assertion.
#[derive(Default)]
struct RecordingSink {
    partials: Mutex<Vec<String>>,
    outcomes: Mutex<Vec<LoopOutcome>>,
    follow_ups: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn on_partial_update(&self, text: &str, _thoughts: Option<&str>) {
        self.partials.lock().unwrap().push(text.to_string());
    }

    async fn on_turn_done(&self, outcome: &LoopOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }

    async fn on_follow_ups(&self, suggestions: Vec<String>) {
        self.follow_ups.lock().unwrap().extend(suggestions);
    }
}

/// Browser backend that answers every capability with a fixed snapshot.
#[derive(Default)]
struct ScriptedBrowser {
    calls: Mutex<Vec<Capability>>,
}

#[async_trait]
impl BrowserBackend for ScriptedBrowser {
    async fn execute(
        &self,
        capability: Capability,
        _args: &Value,
    ) -> Result<LocalToolOutput, ToolError> {
        self.calls.lock().unwrap().push(capability);
        Ok(LocalToolOutput::text("Heading: Example Domain"))
    }
}

#[derive(Default)]
struct VecHistory {
    entries: Mutex<Vec<String>>,
}

#[async_trait]
impl HistoryStore for VecHistory {
    async fn append_user_message(&self, _session: &SessionId, text: &str) -> lariat_core::Result<()> {
        self.entries.lock().unwrap().push(format!("user: {text}"));
        Ok(())
    }

    async fn append_ai_message(&self, _session: &SessionId, text: &str) -> lariat_core::Result<()> {
        self.entries.lock().unwrap().push(format!("ai: {text}"));
        Ok(())
    }
}

async fn coordinator_for(server: &MockServer) -> Arc<RequestCoordinator> {
    let transport = Arc::new(
        HttpTransport::new(format!("{}/stream", server.uri())).with_cookie("session=e2e"),
    );
    let coordinator = Arc::new(RequestCoordinator::new(transport));
    coordinator
        .set_auth(AuthSession::new("tok_e2e", "bl_e2e"))
        .await;
    coordinator
}

// ── E2E: tool-call round trip ────────────────────────────────────────────

#[tokio::test]
async fn agent_executes_a_requested_tool_and_returns_the_final_answer() {
    // Scenario: the model asks for a page snapshot, observes it, and then
    // answers. Two backend calls, one browser call.
    let server = MockServer::start().await;
    let tool_reply =
        "Let me check the page.\n```json\n{\"tool\": \"take_snapshot\", \"args\": {}}\n```";

    Mock::given(method("POST"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&[
            reply_line("c_1", "r_1", "rc_1", "Let me check the page."),
            reply_line("c_1", "r_1", "rc_1", tool_reply),
        ])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&[reply_line(
            "c_1",
            "r_2",
            "rc_2",
            "The page shows Example Domain.",
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server).await;
    let browser = Arc::new(ScriptedBrowser::default());
    let invoker = Arc::new(ToolInvoker::new().with_browser(browser.clone()));
    let history = Arc::new(VecHistory::default());
    let agent = Arc::new(
        AgentLoop::new(coordinator, invoker, history.clone())
            .with_backoff(Duration::from_millis(1), Duration::from_millis(2)),
    );
    let registry = LoopRegistry::new(agent);

    let sink = Arc::new(RecordingSink::default());
    let request = PromptRequest::new("what is on the page?").with_browser_control(true);
    let handle = registry.start(request, sink.clone()).await;
    let outcome = handle.join().await;

    assert_eq!(
        outcome,
        LoopOutcome::Done {
            text: "The page shows Example Domain.".into(),
            loops_run: 1,
        }
    );
    assert_eq!(
        browser.calls.lock().unwrap().clone(),
        vec![Capability::TakeSnapshot]
    );
    assert_eq!(
        sink.partials.lock().unwrap().clone(),
        vec![
            "Let me check the page.".to_string(),
            tool_reply.to_string(),
            "The page shows Example Domain.".to_string(),
        ]
    );

    // Both exchanges persisted: the user's prompt, the tool-call reply, the
    // observation prompt, the final answer.
    let entries = history.entries.lock().unwrap().clone();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0], "user: what is on the page?");
    assert_eq!(entries[1], format!("ai: {tool_reply}"));
    assert!(entries[2].starts_with("user: Tool result for \"take_snapshot\":"));
    assert!(entries[2].contains("Heading: Example Domain"));
    assert_eq!(entries[3], "ai: The page shows Example Domain.");
}

// ── E2E: tools disabled ──────────────────────────────────────────────────

#[tokio::test]
async fn plain_prompt_without_tools_is_final_on_the_first_reply() {
    // Even a reply that looks like a tool call stands as the final answer
    // when no tool domain is enabled.
    let server = MockServer::start().await;
    let text = "```json\n{\"tool\": \"take_snapshot\"}\n```";

    Mock::given(method("POST"))
        .and(path("/stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(stream_body(&[reply_line("c_1", "r_1", "rc_1", text)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server).await;
    let browser = Arc::new(ScriptedBrowser::default());
    let invoker = Arc::new(ToolInvoker::new().with_browser(browser.clone()));
    let history = Arc::new(VecHistory::default());
    let agent = Arc::new(AgentLoop::new(coordinator, invoker, history));

    let sink = Arc::new(RecordingSink::default());
    let handle = agent.start(PromptRequest::new("hello"), sink.clone());
    let outcome = handle.join().await;

    assert_eq!(
        outcome,
        LoopOutcome::Done {
            text: text.into(),
            loops_run: 0,
        }
    );
    assert!(browser.calls.lock().unwrap().is_empty());
    assert_eq!(sink.outcomes.lock().unwrap().len(), 1);
}

// ── E2E: backend failure ─────────────────────────────────────────────────

#[tokio::test]
async fn backend_failure_surfaces_as_a_failed_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server).await;
    let invoker = Arc::new(ToolInvoker::new());
    let history = Arc::new(VecHistory::default());
    let agent = Arc::new(AgentLoop::new(coordinator, invoker, history.clone()));

    let sink = Arc::new(RecordingSink::default());
    let handle = agent.start(PromptRequest::new("hello"), sink.clone());
    let outcome = handle.join().await;

    assert_eq!(sink.outcomes.lock().unwrap().clone(), vec![outcome.clone()]);
    match outcome {
        LoopOutcome::Failed { error, loops_run } => {
            assert!(error.contains("500"));
            assert_eq!(loops_run, 0);
        }
        other => panic!("expected a failed outcome, got {other:?}"),
    }
    // Nothing reached the model, so nothing was persisted.
    assert!(history.entries.lock().unwrap().is_empty());
}

// ── E2E: follow-up suggestions ───────────────────────────────────────────

#[tokio::test]
async fn follow_up_suggestions_arrive_after_the_final_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&[reply_line(
            "c_1",
            "r_1",
            "rc_1",
            "Paris is the capital of France.",
        )])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&[reply_line(
            "c_1",
            "r_2",
            "rc_2",
            "1. What about Lyon?\n2. How large is Paris?",
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = coordinator_for(&server).await;
    let sink = Arc::new(RecordingSink::default());
    let invoker = Arc::new(ToolInvoker::new());
    let history = Arc::new(VecHistory::default());
    let agent = Arc::new(
        AgentLoop::new(coordinator.clone(), invoker, history).with_post_processor(Arc::new(
            FollowUpSuggester::new(coordinator, sink.clone()).with_count(2),
        )),
    );

    let handle = agent.start(PromptRequest::new("capital of France?"), sink.clone());
    let outcome = handle.join().await;
    assert!(outcome.is_done());

    // Suggestion generation runs detached; wait for it to land.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while sink.follow_ups.lock().unwrap().is_empty() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "no follow-ups before the deadline"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(
        sink.follow_ups.lock().unwrap().clone(),
        vec![
            "What about Lyon?".to_string(),
            "How large is Paris?".to_string(),
        ]
    );
}
