//! Tool backend traits for the two execution domains.

use async_trait::async_trait;

use crate::capability::Capability;
use crate::error::ToolError;
use crate::tool::LocalToolOutput;

/// Executes privileged browser-side capabilities.
///
/// Implementations live in the host surface (an extension page, a driver, a
/// test double); the invoker only routes to them.
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    async fn execute(
        &self,
        capability: Capability,
        args: &serde_json::Value,
    ) -> std::result::Result<LocalToolOutput, ToolError>;
}

/// Calls tools exposed by a remote tool server.
#[async_trait]
pub trait RemoteToolBackend: Send + Sync {
    /// Human-readable server name, for logs and result attribution.
    fn server_name(&self) -> &str;

    /// Invoke a named tool. The result value is server-defined; the invoker
    /// normalizes it to observation text.
    async fn call_tool(
        &self,
        name: &str,
        args: &serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError>;
}
