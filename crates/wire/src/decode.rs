//! Incremental decoder for the cumulative-snapshot response stream.
//!
//! The raw stream interleaves control lines (an anti-hijacking prefix,
//! segment lengths, acknowledgements) with data lines. Only lines carrying
//! the envelope marker decode to anything; everything else is skipped, not
//! an error. Each decoded snapshot carries the whole reply so far, so the
//! latest snapshot always supersedes the ones before it.

use lariat_core::{ReplyIds, ReplySnapshot};
use serde_json::Value;
use thiserror::Error;

/// Marker on response entries that carry reply payloads.
const ENVELOPE_MARKER: &str = "wrb.fr";

/// Wire codec failures.
#[derive(Debug, Clone, Error)]
pub enum WireError {
    /// The stream opened with an HTML document instead of array lines:
    /// the backend's signed-out signature.
    #[error("stream is an HTML document, not a reply (signed out)")]
    LoginWall,

    /// Request payload could not be encoded.
    #[error("payload encoding failed: {0}")]
    Encode(String),
}

/// Push parser for the response stream.
///
/// Chunks may split lines at any byte. Feed each chunk to [`push`], then call
/// [`finish`] once the stream ends to flush a final unterminated line.
///
/// [`push`]: StreamDecoder::push
/// [`finish`]: StreamDecoder::finish
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: String,
    seen_content: bool,
    halted: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk. Returns every snapshot decoded from lines this chunk
    /// completed, in decode order.
    ///
    /// The first non-whitespace byte decides whether this is a reply stream
    /// at all: an array stream opens with `[`, a digit, or the anti-hijacking
    /// prefix, never `<`. An HTML document here means the login wall, and the
    /// decoder refuses all further input once it has seen one.
    pub fn push(&mut self, chunk: &str) -> Result<Vec<ReplySnapshot>, WireError> {
        if self.halted {
            return Err(WireError::LoginWall);
        }
        if !self.seen_content {
            let lead = chunk.trim_start();
            if lead.is_empty() {
                self.buffer.push_str(chunk);
                return Ok(Vec::new());
            }
            self.seen_content = true;
            if lead.starts_with('<') {
                self.halted = true;
                return Err(WireError::LoginWall);
            }
        }
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            events.extend(decode_line(&line));
        }
        Ok(events)
    }

    /// Flush whatever is left in the buffer at stream end.
    pub fn finish(&mut self) -> Result<Vec<ReplySnapshot>, WireError> {
        if self.halted {
            return Err(WireError::LoginWall);
        }
        let rest = std::mem::take(&mut self.buffer);
        Ok(decode_line(&rest))
    }
}

/// Decode one complete line. Non-envelope lines and payloads that do not
/// match the reply shape decode to nothing.
fn decode_line(line: &str) -> Vec<ReplySnapshot> {
    let trimmed = line.trim();
    // Cheap gate: an envelope entry always contains the marker verbatim.
    if trimmed.is_empty() || !trimmed.contains(ENVELOPE_MARKER) {
        return Vec::new();
    }
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(trimmed) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for entry in &entries {
        let Some(parts) = entry.as_array() else {
            continue;
        };
        if parts.first().and_then(Value::as_str) != Some(ENVELOPE_MARKER) {
            continue;
        }
        let Some(payload) = parts.get(2).and_then(Value::as_str) else {
            continue;
        };
        if let Some(snapshot) = decode_payload(payload) {
            events.push(snapshot);
        }
    }
    events
}

/// Second decode stage: the envelope payload is a JSON-encoded string
/// holding a positional array with the thread ids at index 1 and the
/// candidate list at index 4.
///
/// Returns `None` for payloads that do not carry a reply; acknowledgement
/// entries share the envelope shape and are expected here.
pub fn decode_payload(payload: &str) -> Option<ReplySnapshot> {
    let body: Value = serde_json::from_str(payload).ok()?;

    let thread = body.get(1)?.as_array()?;
    let conversation_id = thread.first()?.as_str()?;
    let response_id = thread.get(1)?.as_str()?;

    let candidates = body.get(4)?.as_array()?;
    let candidate = candidates.first()?.as_array()?;
    let choice_id = candidate.first()?.as_str()?;
    let text = candidate.get(1)?.as_array()?.first()?.as_str()?;
    let thoughts = candidate.get(37).and_then(collect_thoughts);

    Some(ReplySnapshot {
        text: text.to_string(),
        thoughts,
        ids: ReplyIds::new(conversation_id, response_id, choice_id),
    })
}

/// Thought summaries ride in an optional slot whose nesting has drifted
/// across backend revisions. Collect every string found there instead of
/// hard-coding one path.
fn collect_thoughts(slot: &Value) -> Option<String> {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) if !s.is_empty() => out.push(s.clone()),
            Value::Array(items) => {
                for item in items {
                    walk(item, out);
                }
            }
            _ => {}
        }
    }

    let mut parts = Vec::new();
    walk(slot, &mut parts);
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
