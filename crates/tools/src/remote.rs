//! HTTP backend for remote tool servers.
//!
//! Speaks the JSON-RPC `tools/call` convention over a single POST endpoint.
//! Transport and protocol failures surface as `ToolError`s; the invoker
//! turns them into observation text.

use async_trait::async_trait;
use lariat_core::{RemoteToolBackend, ToolError};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct HttpRemoteBackend {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl HttpRemoteBackend {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl RemoteToolBackend for HttpRemoteBackend {
    fn server_name(&self) -> &str {
        &self.name
    }

    async fn call_tool(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": Uuid::new_v4().to_string(),
            "method": "tools/call",
            "params": {
                "name": name,
                "arguments": args,
            },
        });

        debug!(server = %self.name, tool = name, "Calling remote tool");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::Backend(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(ToolError::Backend(format!(
                "{} answered with status {status}",
                self.name
            )));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Backend(format!("invalid response body: {e}")))?;

        if let Some(error) = reply.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified server error");
            return Err(ToolError::ExecutionFailed {
                tool_name: name.to_string(),
                reason: message.to_string(),
            });
        }

        Ok(reply.get("result").cloned().unwrap_or(Value::Null))
    }
}
