//! Tool resolution, policy, and execution.

use std::sync::Arc;

use lariat_core::{
    BrowserBackend, Capability, PromptRequest, RemoteToolBackend, RemoteToolMode, ToolError,
    ToolFile, ToolInvocation, ToolResult, ToolSource,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Remote-domain filtering for one run.
#[derive(Debug, Clone)]
pub struct RemoteToolPolicy {
    mode: RemoteToolMode,
    enabled: Vec<String>,
}

impl RemoteToolPolicy {
    /// Permit every tool the server exposes.
    pub fn all() -> Self {
        Self {
            mode: RemoteToolMode::All,
            enabled: Vec::new(),
        }
    }

    /// Permit only the named tools.
    pub fn selected(enabled: Vec<String>) -> Self {
        Self {
            mode: RemoteToolMode::Selected,
            enabled,
        }
    }

    /// Check a tool name against the policy. Runs before any backend call,
    /// so a refusal costs zero network traffic.
    fn permit(&self, name: &str) -> Result<(), ToolError> {
        match self.mode {
            RemoteToolMode::All => Ok(()),
            RemoteToolMode::Selected => {
                if self.enabled.iter().any(|tool| tool == name) {
                    Ok(())
                } else {
                    Err(ToolError::PolicyDenied {
                        tool_name: name.to_string(),
                        reason: "not in the enabled tool set".into(),
                    })
                }
            }
        }
    }
}

/// Per-run tool access, derived from the prompt request.
#[derive(Debug, Clone)]
pub struct ToolAccess {
    pub browser_enabled: bool,
    pub remote_enabled: bool,
    pub policy: RemoteToolPolicy,
}

impl ToolAccess {
    pub fn from_request(request: &PromptRequest) -> Self {
        let policy = match request.remote_tool_mode {
            RemoteToolMode::All => RemoteToolPolicy::all(),
            RemoteToolMode::Selected => {
                RemoteToolPolicy::selected(request.remote_enabled_tools.clone())
            }
        };
        Self {
            browser_enabled: request.enable_browser_control,
            remote_enabled: request.enable_remote_tools,
            policy,
        }
    }

    /// Access with both domains open and no filtering. For snapshots the
    /// loop takes on its own behalf.
    pub fn unrestricted() -> Self {
        Self {
            browser_enabled: true,
            remote_enabled: true,
            policy: RemoteToolPolicy::all(),
        }
    }
}

/// Routes invocations to the right backend and normalizes results.
#[derive(Default)]
pub struct ToolInvoker {
    browser: Option<Arc<dyn BrowserBackend>>,
    remote: Option<Arc<dyn RemoteToolBackend>>,
}

impl ToolInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_browser(mut self, backend: Arc<dyn BrowserBackend>) -> Self {
        self.browser = Some(backend);
        self
    }

    pub fn with_remote(mut self, backend: Arc<dyn RemoteToolBackend>) -> Self {
        self.remote = Some(backend);
        self
    }

    /// Execute one invocation. Never fails: refusals and backend errors come
    /// back as observation text in a normal result.
    pub async fn execute(&self, invocation: &ToolInvocation, access: &ToolAccess) -> ToolResult {
        match Capability::from_name(&invocation.name) {
            Some(capability) => self.execute_local(capability, invocation, access).await,
            None => self.execute_remote(invocation, access).await,
        }
    }

    async fn execute_local(
        &self,
        capability: Capability,
        invocation: &ToolInvocation,
        access: &ToolAccess,
    ) -> ToolResult {
        if !access.browser_enabled {
            return ToolResult::failure(
                &invocation.name,
                "browser control is disabled for this request",
                ToolSource::Unknown,
            );
        }
        let Some(browser) = &self.browser else {
            return ToolResult::failure(
                &invocation.name,
                "no browser backend is attached",
                ToolSource::Unknown,
            );
        };

        debug!(tool = %capability, source = "local", "Executing tool");
        match browser.execute(capability, &invocation.args).await {
            Ok(output) => {
                let mut files = Vec::new();
                let text = match output.image {
                    Some(image) => {
                        // The image goes to the UI as a file; the model only
                        // ever sees a short description of it.
                        let description = if output.text.is_empty() {
                            format!("Captured a {} image.", image.mime)
                        } else {
                            output.text
                        };
                        files.push(ToolFile {
                            data: image.data,
                            mime: image.mime.clone(),
                            name: attachment_name(capability, &image.mime),
                        });
                        description
                    }
                    None => output.text,
                };
                ToolResult::success(&invocation.name, text, ToolSource::Local).with_files(files)
            }
            Err(error) => {
                warn!(tool = %capability, error = %error, "Local tool failed");
                ToolResult::failure(&invocation.name, error, ToolSource::Local)
            }
        }
    }

    async fn execute_remote(&self, invocation: &ToolInvocation, access: &ToolAccess) -> ToolResult {
        if !access.remote_enabled {
            return ToolResult::failure(
                &invocation.name,
                "remote tools are disabled for this request",
                ToolSource::Unknown,
            );
        }
        if let Err(error) = access.policy.permit(&invocation.name) {
            warn!(tool = %invocation.name, "Tool refused by selection policy");
            return ToolResult::failure(&invocation.name, error, ToolSource::Unknown);
        }
        let Some(remote) = &self.remote else {
            return ToolResult::failure(
                &invocation.name,
                "no remote tool backend is attached",
                ToolSource::Unknown,
            );
        };

        debug!(tool = %invocation.name, server = remote.server_name(), source = "remote", "Executing tool");
        match remote.call_tool(&invocation.name, &invocation.args).await {
            Ok(value) => {
                ToolResult::success(&invocation.name, render_remote_value(&value), ToolSource::Remote)
            }
            Err(error) => {
                warn!(tool = %invocation.name, error = %error, "Remote tool failed");
                ToolResult::failure(&invocation.name, error, ToolSource::Remote)
            }
        }
    }
}

fn attachment_name(capability: Capability, mime: &str) -> String {
    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "bin",
    };
    format!("{capability}.{extension}")
}

/// Flatten a remote result value to observation text. Tool servers commonly
/// answer with a `content` list of typed text parts; anything else is
/// rendered as JSON.
fn render_remote_value(value: &Value) -> String {
    if let Some(parts) = value.get("content").and_then(Value::as_array) {
        let texts: Vec<&str> = parts
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        if !texts.is_empty() {
            return texts.join("\n");
        }
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lariat_core::{ImagePayload, LocalToolOutput};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBrowser {
        calls: Mutex<Vec<(Capability, Value)>>,
        output: Mutex<Option<Result<LocalToolOutput, ToolError>>>,
    }

    impl RecordingBrowser {
        fn returning(output: Result<LocalToolOutput, ToolError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                output: Mutex::new(Some(output)),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BrowserBackend for RecordingBrowser {
        async fn execute(
            &self,
            capability: Capability,
            args: &Value,
        ) -> Result<LocalToolOutput, ToolError> {
            self.calls.lock().unwrap().push((capability, args.clone()));
            self.output
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Ok(LocalToolOutput::text("ok")))
        }
    }

    struct CountingRemote {
        calls: AtomicUsize,
        response: Mutex<Option<Result<Value, ToolError>>>,
    }

    impl CountingRemote {
        fn returning(response: Result<Value, ToolError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Mutex::new(Some(response)),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteToolBackend for CountingRemote {
        fn server_name(&self) -> &str {
            "test-server"
        }

        async fn call_tool(&self, _name: &str, _args: &Value) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Ok(Value::Null))
        }
    }

    #[tokio::test]
    async fn capability_names_route_to_the_browser_backend() {
        let browser = Arc::new(RecordingBrowser::returning(Ok(LocalToolOutput::text(
            "https://example.com loaded",
        ))));
        let invoker = ToolInvoker::new().with_browser(browser.clone());

        let invocation = ToolInvocation::new("navigate", json!({"url": "https://example.com"}));
        let result = invoker
            .execute(&invocation, &ToolAccess::unrestricted())
            .await;

        assert_eq!(result.source, ToolSource::Local);
        assert_eq!(result.output, "https://example.com loaded");
        assert_eq!(browser.call_count(), 1);
        let calls = browser.calls.lock().unwrap();
        assert_eq!(calls[0].0, Capability::Navigate);
        assert_eq!(calls[0].1, json!({"url": "https://example.com"}));
    }

    #[tokio::test]
    async fn unknown_names_route_to_the_remote_backend() {
        let remote = Arc::new(CountingRemote::returning(Ok(json!({
            "content": [{"type": "text", "text": "9 rows"}]
        }))));
        let invoker = ToolInvoker::new().with_remote(remote.clone());

        let invocation = ToolInvocation::new("query_database", json!({"sql": "select 1"}));
        let result = invoker
            .execute(&invocation, &ToolAccess::unrestricted())
            .await;

        assert_eq!(result.source, ToolSource::Remote);
        assert_eq!(result.output, "9 rows");
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn selected_mode_refuses_unlisted_tools_with_zero_calls() {
        let remote = Arc::new(CountingRemote::returning(Ok(Value::Null)));
        let invoker = ToolInvoker::new().with_remote(remote.clone());
        let access = ToolAccess {
            browser_enabled: false,
            remote_enabled: true,
            policy: RemoteToolPolicy::selected(vec!["a".into()]),
        };

        let invocation = ToolInvocation::new("b", json!({}));
        let result = invoker.execute(&invocation, &access).await;

        assert!(result.is_error());
        assert_eq!(result.source, ToolSource::Unknown);
        assert!(result.output.contains("not allowed"));
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn selected_mode_permits_listed_tools() {
        let remote = Arc::new(CountingRemote::returning(Ok(json!("done"))));
        let invoker = ToolInvoker::new().with_remote(remote.clone());
        let access = ToolAccess {
            browser_enabled: false,
            remote_enabled: true,
            policy: RemoteToolPolicy::selected(vec!["a".into(), "b".into()]),
        };

        let result = invoker
            .execute(&ToolInvocation::new("a", json!({})), &access)
            .await;
        assert!(!result.is_error());
        assert_eq!(result.output, "done");
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn backend_failures_become_observation_text() {
        let remote = Arc::new(CountingRemote::returning(Err(ToolError::Backend(
            "connection refused".into(),
        ))));
        let invoker = ToolInvoker::new().with_remote(remote);

        let result = invoker
            .execute(
                &ToolInvocation::new("fetch_page", json!({})),
                &ToolAccess::unrestricted(),
            )
            .await;

        assert!(result.is_error());
        assert_eq!(result.source, ToolSource::Remote);
        assert!(result.output.starts_with("Error executing tool:"));
        assert!(result.output.contains("connection refused"));
    }

    #[tokio::test]
    async fn captured_images_split_into_description_and_file() {
        let browser = Arc::new(RecordingBrowser::returning(Ok(LocalToolOutput {
            text: String::new(),
            image: Some(ImagePayload {
                data: "aWJkZWFkYmVlZg==".into(),
                mime: "image/png".into(),
            }),
        })));
        let invoker = ToolInvoker::new().with_browser(browser);

        let result = invoker
            .execute(
                &ToolInvocation::new("take_screenshot", json!({})),
                &ToolAccess::unrestricted(),
            )
            .await;

        assert_eq!(result.output, "Captured a image/png image.");
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].name, "take_screenshot.png");
        assert_eq!(result.files[0].mime, "image/png");
        // The base64 payload never leaks into the observation text.
        assert!(!result.output.contains("aWJkZWFkYmVlZg"));
    }

    #[tokio::test]
    async fn disabled_domains_refuse_without_touching_backends() {
        let browser = Arc::new(RecordingBrowser::default());
        let remote = Arc::new(CountingRemote::returning(Ok(Value::Null)));
        let invoker = ToolInvoker::new()
            .with_browser(browser.clone())
            .with_remote(remote.clone());
        let access = ToolAccess {
            browser_enabled: false,
            remote_enabled: false,
            policy: RemoteToolPolicy::all(),
        };

        let local = invoker
            .execute(&ToolInvocation::new("click", json!({})), &access)
            .await;
        let remote_result = invoker
            .execute(&ToolInvocation::new("anything", json!({})), &access)
            .await;

        assert!(local.is_error());
        assert!(remote_result.is_error());
        assert_eq!(local.source, ToolSource::Unknown);
        assert_eq!(remote_result.source, ToolSource::Unknown);
        assert_eq!(browser.call_count(), 0);
        assert_eq!(remote.call_count(), 0);
    }

    #[test]
    fn remote_values_render_to_text() {
        assert_eq!(
            render_remote_value(&json!({"content": [
                {"type": "text", "text": "line one"},
                {"type": "image", "data": "zzz"},
                {"type": "text", "text": "line two"},
            ]})),
            "line one\nline two"
        );
        assert_eq!(render_remote_value(&json!("plain")), "plain");
        assert_eq!(render_remote_value(&Value::Null), "");
        assert!(render_remote_value(&json!({"rows": 3})).contains("\"rows\": 3"));
    }
}
