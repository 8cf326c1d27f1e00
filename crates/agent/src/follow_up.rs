//! Follow-up suggestion generation after a completed run.

use std::sync::Arc;

use async_trait::async_trait;
use lariat_core::{Dispatcher, NotificationSink, SessionId, StreamPrompt, TurnPostProcessor};
use tracing::debug;

const DEFAULT_COUNT: usize = 3;

/// Asks the model for follow-up questions once a run completes.
///
/// Runs on the dispatcher's internal request domain, so it never disturbs an
/// in-flight user turn and dies quietly on reset. Failures are logged at
/// debug and dropped: suggestions are decoration, not data.
pub struct FollowUpSuggester {
    dispatcher: Arc<dyn Dispatcher>,
    sink: Arc<dyn NotificationSink>,
    count: usize,
}

impl FollowUpSuggester {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            dispatcher,
            sink,
            count: DEFAULT_COUNT,
        }
    }

    /// Set how many suggestions to ask for.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    fn prompt_for(&self, final_text: &str) -> StreamPrompt {
        StreamPrompt::new(format!(
            "Based on this answer, suggest {} short follow-up questions the user might ask \
             next. Reply with one question per line and nothing else.\n\n{final_text}",
            self.count
        ))
    }
}

#[async_trait]
impl TurnPostProcessor for FollowUpSuggester {
    async fn after_turn(&self, session: &SessionId, final_text: &str) {
        match self
            .dispatcher
            .dispatch_internal(self.prompt_for(final_text))
            .await
        {
            Ok(Some(reply)) => {
                let suggestions = parse_suggestions(&reply.text, self.count);
                if suggestions.is_empty() {
                    debug!(session = %session, "No usable follow-up suggestions");
                    return;
                }
                debug!(
                    session = %session,
                    count = suggestions.len(),
                    "Delivering follow-up suggestions"
                );
                self.sink.on_follow_ups(suggestions).await;
            }
            Ok(None) => {}
            Err(error) => {
                debug!(session = %session, error = %error, "Follow-up generation failed");
            }
        }
    }
}

/// One suggestion per line. Bullets, numbering, and fences are stripped;
/// header-looking lines are skipped.
fn parse_suggestions(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(clean_line)
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .take(limit)
        .map(str::to_string)
        .collect()
}

fn clean_line(line: &str) -> &str {
    let line = line.trim();
    if line.starts_with("```") {
        return "";
    }
    let line = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .unwrap_or(line);
    strip_numbering(line)
}

fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }
    line
}
