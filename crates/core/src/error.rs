//! Error types for the Lariat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Two outcomes are deliberately **not** errors anywhere in this taxonomy:
//! a cancelled request (surfaces as `Ok(None)` from the dispatcher) and a
//! malformed tool-call block in model output (surfaces as "no tool call").

use thiserror::Error;

/// The top-level error type for all Lariat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Streaming client errors ---
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- History persistence ---
    #[error("History error: {0}")]
    History(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failure classes for a streamed backend request.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Network failure, unexpected status, or a stream that could not be
    /// decoded into a reply.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The backend answered with its signed-out signature. The conversation
    /// context has been cleared; the user must re-authenticate.
    #[error("Authentication expired")]
    AuthExpired,

    /// Explicit backend throttling (HTTP 429).
    #[error("Rate limited by the backend")]
    RateLimited,

    /// Required client state is missing (no auth configured, unknown model).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool {tool_name} not allowed: {reason}")]
    PolicyDenied { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool backend error: {0}")]
    Backend(String),
}
