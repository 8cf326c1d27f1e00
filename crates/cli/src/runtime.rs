//! Wires configuration into a running client stack.

use std::sync::Arc;

use lariat_agent::{AgentLoop, FollowUpSuggester, LoopRegistry};
use lariat_client::{HttpTransport, ModelCatalog, RequestCoordinator};
use lariat_config::AppConfig;
use lariat_core::{NotificationSink, PromptRequest, SessionId};
use lariat_tools::{HttpRemoteBackend, ToolInvoker};
use tracing::debug;

/// The assembled client stack behind one CLI invocation.
///
/// All turns started through [`Runtime::request`] share one session id, so
/// the loop registry supersedes a still-running turn when a new one starts.
pub struct Runtime {
    pub coordinator: Arc<RequestCoordinator>,
    pub registry: LoopRegistry,
    pub history: Arc<crate::history::InMemoryHistory>,
    config: AppConfig,
    session: SessionId,
}

impl Runtime {
    /// Build the stack from config, or explain what is missing.
    ///
    /// When `follow_ups` carries a sink, a follow-up suggester is attached
    /// as the post-turn processor and reports through that sink.
    pub async fn build(
        config: AppConfig,
        follow_ups: Option<Arc<dyn NotificationSink>>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if config.backend.base_url.is_empty() {
            eprintln!();
            eprintln!("  ERROR: No backend URL configured!");
            eprintln!();
            eprintln!("  Add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            eprintln!("  [backend]");
            eprintln!("  base_url = \"https://...\"");
            eprintln!();
            return Err("No backend URL found. See above for setup instructions.".into());
        }

        let Some(auth) = config.auth.session() else {
            eprintln!();
            eprintln!("  ERROR: No auth token configured!");
            eprintln!();
            eprintln!("  Set these environment variables:");
            eprintln!("    LARIAT_AUTH_TOKEN='...'   (the anti-CSRF token)");
            eprintln!("    LARIAT_COOKIE='...'       (the session cookie)");
            eprintln!();
            eprintln!("  Or add them to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err("No auth token found. See above for setup instructions.".into());
        };

        let mut transport = HttpTransport::new(config.backend.base_url.clone())
            .with_timeout(config.backend.request_timeout());
        if let Some(cookie) = &config.auth.cookie {
            transport = transport.with_cookie(cookie.clone());
        }

        let mut catalog = ModelCatalog::new(config.model.default_target());
        for (name, target) in &config.model.targets {
            catalog.insert(name.clone(), target.clone());
        }

        let coordinator = Arc::new(
            RequestCoordinator::new(Arc::new(transport))
                .with_locale(config.backend.locale.clone())
                .with_models(catalog),
        );
        coordinator.set_auth(auth).await;

        let mut invoker = ToolInvoker::new();
        if let Some(url) = &config.remote_tools.url {
            debug!(url = %url, "Attaching remote tool backend");
            invoker = invoker.with_remote(Arc::new(HttpRemoteBackend::new("remote", url.clone())));
        }

        let history = Arc::new(crate::history::InMemoryHistory::new());

        let mut agent = AgentLoop::new(
            coordinator.clone(),
            Arc::new(invoker),
            history.clone(),
        )
        .with_backoff(config.agent.backoff_min(), config.agent.backoff_max());
        if let Some(sink) = follow_ups {
            agent = agent.with_post_processor(Arc::new(FollowUpSuggester::new(
                coordinator.clone(),
                sink,
            )));
        }

        let registry = LoopRegistry::new(Arc::new(agent));

        Ok(Self {
            coordinator,
            registry,
            history,
            config,
            session: SessionId::new(),
        })
    }

    /// A prompt request carrying the configured tool policy and session.
    pub fn request(&self, text: impl Into<String>, model: Option<&str>) -> PromptRequest {
        let agent = &self.config.agent;
        let remote = &self.config.remote_tools;
        PromptRequest::new(text)
            .with_session(self.session.clone())
            .with_model(model.unwrap_or_default())
            .with_browser_control(agent.enable_browser_control)
            .with_remote_tools(agent.enable_remote_tools)
            .with_loop_budget(agent.loop_budget())
            .with_remote_tool_mode(
                remote.tool_mode().unwrap_or_default(),
                remote.enabled.clone(),
            )
    }
}
