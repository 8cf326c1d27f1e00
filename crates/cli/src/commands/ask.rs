//! `lariat ask`, the single-prompt mode.

use std::sync::Arc;

use lariat_config::AppConfig;
use lariat_core::LoopOutcome;

use crate::runtime::Runtime;
use crate::sink::ConsoleSink;

pub async fn run(prompt: String, model: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // No follow-up suggester here: the process exits as soon as the answer
    // lands, before a detached suggestion request could finish.
    let runtime = Runtime::build(config, None).await?;

    let sink = Arc::new(ConsoleSink::new());
    let request = runtime.request(prompt, model.as_deref());
    let handle = runtime.registry.start(request, sink).await;

    match handle.join().await {
        LoopOutcome::Done { .. } => Ok(()),
        LoopOutcome::Failed { error, .. } => Err(error.into()),
        LoopOutcome::Cancelled => Ok(()),
    }
}
