//! # Lariat Core
//!
//! Domain types, traits, and error definitions for the Lariat agentic chat
//! client. This crate has **zero framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod backend;
pub mod capability;
pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod prompt;
pub mod reply;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use backend::{BrowserBackend, RemoteToolBackend};
pub use capability::Capability;
pub use dispatch::{Dispatcher, SnapshotObserver, StreamPrompt};
pub use error::{ClientError, Error, Result, ToolError};
pub use hooks::{HistoryStore, LoopOutcome, NotificationSink, PromptAssembler, TurnPostProcessor};
pub use prompt::{AssembledPrompt, LoopBudget, ModelTarget, PromptFile, PromptRequest, RemoteToolMode};
pub use reply::{ReplySnapshot, TurnReply};
pub use session::{AuthSession, ConversationContext, ReplyIds, SessionId};
pub use tool::{ImagePayload, LocalToolOutput, ToolFile, ToolInvocation, ToolResult, ToolSource};
