//! Terminal rendering for streamed replies.

use std::io::Write;

use async_trait::async_trait;
use lariat_core::{LoopOutcome, NotificationSink};
use tokio::sync::Mutex;

/// Prints cumulative reply snapshots as they stream in.
///
/// Snapshots grow within one model turn, so the sink remembers what it has
/// already printed and emits only the new suffix. When a snapshot no longer
/// extends the printed text (the loop started a fresh iteration after a
/// tool call) it separates the two turns with a blank line and starts over.
pub struct ConsoleSink {
    printed: Mutex<String>,
    label: Option<&'static str>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            printed: Mutex::new(String::new()),
            label: None,
        }
    }

    /// Print this label before the first text of every turn.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn emit(&self, printed: &mut String, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut out = std::io::stdout().lock();
        if let Some(suffix) = text.strip_prefix(printed.as_str()) {
            if printed.is_empty() {
                if let Some(label) = self.label {
                    let _ = write!(out, "{label}");
                }
            }
            let _ = write!(out, "{suffix}");
        } else {
            if !printed.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out);
            }
            if let Some(label) = self.label {
                let _ = write!(out, "{label}");
            }
            let _ = write!(out, "{text}");
        }
        let _ = out.flush();
        printed.clear();
        printed.push_str(text);
    }
}

#[async_trait]
impl NotificationSink for ConsoleSink {
    async fn on_partial_update(&self, text: &str, _thoughts: Option<&str>) {
        let mut printed = self.printed.lock().await;
        self.emit(&mut printed, text);
    }

    async fn on_turn_done(&self, outcome: &LoopOutcome) {
        let mut printed = self.printed.lock().await;
        match outcome {
            LoopOutcome::Done { text, .. } => {
                self.emit(&mut printed, text);
                println!();
            }
            LoopOutcome::Failed { .. } | LoopOutcome::Cancelled => {
                // The command reports the error; just end any open line.
                if !printed.is_empty() {
                    println!();
                }
            }
        }
        printed.clear();
    }

    async fn on_follow_ups(&self, suggestions: Vec<String>) {
        if suggestions.is_empty() {
            return;
        }
        println!();
        for suggestion in suggestions {
            println!("  Try: {suggestion}");
        }
    }
}
