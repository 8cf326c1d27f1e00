//! Configuration loading and validation for Lariat.
//!
//! Loads `~/.lariat/config.toml` with environment variable overrides and
//! validates the settings at startup. Credentials never appear in Debug
//! output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lariat_core::{AuthSession, LoopBudget, ModelTarget, RemoteToolMode};
use serde::{Deserialize, Serialize};

/// The root configuration structure.
///
/// Maps directly to `~/.lariat/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Streaming backend endpoint settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Credentials for the backend session
    #[serde(default)]
    pub auth: AuthConfig,

    /// Model routing configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Remote tool server settings
    #[serde(default)]
    pub remote_tools: RemoteToolsConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the streaming endpoint. Empty until configured; the CLI
    /// refuses to dispatch without it.
    #[serde(default)]
    pub base_url: String,

    /// Locale sent in the request envelope
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Whole-request timeout; long replies stream for minutes
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_locale() -> String {
    "en".into()
}
fn default_timeout_secs() -> u64 {
    300
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            locale: default_locale(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session cookie sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,

    /// Per-session request token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Build label the backend expects as a query parameter
    #[serde(default)]
    pub bl: String,
}

impl AuthConfig {
    /// Build the wire-level auth session, if a token is configured.
    pub fn session(&self) -> Option<AuthSession> {
        self.token
            .as_ref()
            .map(|token| AuthSession::new(token.clone(), self.bl.clone()))
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("cookie", &redact(&self.cookie))
            .field("token", &redact(&self.token))
            .field("bl", &self.bl)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name of the target a prompt with no explicit model routes to.
    /// Empty means the backend's own default (null routing slots).
    #[serde(default)]
    pub default: String,

    /// Named model targets; ids are opaque upstream values
    #[serde(default)]
    pub targets: HashMap<String, ModelTarget>,
}

impl ModelConfig {
    /// Resolve the default target. Validated configs always resolve; an
    /// unknown name falls back to null routing slots.
    pub fn default_target(&self) -> ModelTarget {
        if self.default.is_empty() {
            return ModelTarget::default();
        }
        self.targets.get(&self.default).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool iterations per prompt; 0 means unbounded
    #[serde(default = "default_max_loops")]
    pub max_loops: u32,

    /// Lower edge of the inter-iteration backoff window
    #[serde(default = "default_backoff_min_ms")]
    pub backoff_min_ms: u64,

    /// Upper edge of the inter-iteration backoff window
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Allow privileged browser-side tools
    #[serde(default)]
    pub enable_browser_control: bool,

    /// Allow remote tool-server tools
    #[serde(default)]
    pub enable_remote_tools: bool,
}

fn default_max_loops() -> u32 {
    10
}
fn default_backoff_min_ms() -> u64 {
    2000
}
fn default_backoff_max_ms() -> u64 {
    4000
}

impl AgentConfig {
    /// The loop budget, with `0` meaning unbounded.
    pub fn loop_budget(&self) -> LoopBudget {
        LoopBudget::from_raw(self.max_loops)
    }

    pub fn backoff_min(&self) -> Duration {
        Duration::from_millis(self.backoff_min_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_loops: default_max_loops(),
            backoff_min_ms: default_backoff_min_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            enable_browser_control: false,
            enable_remote_tools: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteToolsConfig {
    /// JSON-RPC endpoint of the tool server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Filtering mode: "all" or "selected"
    #[serde(default = "default_tool_mode")]
    pub mode: String,

    /// Allow-list consulted in "selected" mode
    #[serde(default)]
    pub enabled: Vec<String>,
}

fn default_tool_mode() -> String {
    "all".into()
}

impl RemoteToolsConfig {
    /// Decode the mode string; `None` for anything unrecognized.
    pub fn tool_mode(&self) -> Option<RemoteToolMode> {
        match self.mode.as_str() {
            "all" => Some(RemoteToolMode::All),
            "selected" => Some(RemoteToolMode::Selected),
            _ => None,
        }
    }
}

impl Default for RemoteToolsConfig {
    fn default() -> Self {
        Self {
            url: None,
            mode: default_tool_mode(),
            enabled: vec![],
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.lariat/config.toml).
    ///
    /// Environment variables override file values:
    /// - `LARIAT_COOKIE`: session cookie
    /// - `LARIAT_AUTH_TOKEN`: per-session request token
    /// - `LARIAT_MODEL`: default model name
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = Self::config_dir();
        let config_path = config_dir.join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(cookie) = std::env::var("LARIAT_COOKIE") {
            config.auth.cookie = Some(cookie);
        }
        if let Ok(token) = std::env::var("LARIAT_AUTH_TOKEN") {
            config.auth.token = Some(token);
        }
        if let Ok(model) = std::env::var("LARIAT_MODEL") {
            config.model.default = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lariat")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend.request_timeout_secs must be positive".into(),
            ));
        }

        if self.agent.backoff_min_ms > self.agent.backoff_max_ms {
            return Err(ConfigError::ValidationError(
                "agent.backoff_min_ms must not exceed agent.backoff_max_ms".into(),
            ));
        }

        if !self.model.default.is_empty() && !self.model.targets.contains_key(&self.model.default) {
            return Err(ConfigError::ValidationError(format!(
                "model.default names an unknown target: {}",
                self.model.default
            )));
        }

        let mode = self.remote_tools.tool_mode().ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "remote_tools.mode must be \"all\" or \"selected\", got \"{}\"",
                self.remote_tools.mode
            ))
        })?;

        if self.agent.enable_remote_tools {
            if self.remote_tools.url.is_none() {
                return Err(ConfigError::ValidationError(
                    "remote_tools.url is required when agent.enable_remote_tools is set".into(),
                ));
            }
            if mode == RemoteToolMode::Selected && self.remote_tools.enabled.is_empty() {
                return Err(ConfigError::ValidationError(
                    "remote_tools.mode = \"selected\" requires a non-empty remote_tools.enabled list"
                        .into(),
                ));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `lariat init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
