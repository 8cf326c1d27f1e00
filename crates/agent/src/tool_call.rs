//! Tool-call extraction from free-form model text.
//!
//! The model has no native tool-calling surface; the prompt instructs it to
//! end a reply with one fenced block containing
//! `{"tool": "<name>", "args": {...}}`. Anything that does not match that
//! shape exactly is treated as "no tool call" and the reply stands as the
//! final answer. Malformed blocks are deliberately silent: the model is not
//! told it got the format wrong.

use lariat_core::ToolInvocation;
use serde_json::Value;
use tracing::debug;

/// Parse a trailing fenced tool-call block out of a model reply.
///
/// Recognized shape: the trimmed text ends with a closing fence, the matching
/// opening fence may carry a language tag (` ```json `), and the fenced
/// content is a JSON object with a `tool` string and an optional `args`
/// object. Everything else returns `None`:
/// - no fence, or prose after the closing fence
/// - content that is not valid JSON
/// - a missing or non-string `tool` field
/// - `args` present but not an object
pub fn parse_tool_call(text: &str) -> Option<ToolInvocation> {
    let trimmed = text.trim_end();
    let without_close = trimmed.strip_suffix("```")?;
    let open = without_close.rfind("```")?;

    let mut content = &without_close[open + 3..];
    // Drop the language tag from the opening fence line, unless the JSON
    // itself starts there.
    if let Some((first_line, rest)) = content.split_once('\n') {
        if !first_line.trim_start().starts_with('{') {
            content = rest;
        }
    }
    let content = content.trim();
    if !content.starts_with('{') {
        return None;
    }

    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(error) => {
            debug!(error = %error, "Ignoring unparseable tool-call block");
            return None;
        }
    };
    let object = value.as_object()?;
    let name = object.get("tool")?.as_str()?;
    if name.is_empty() {
        return None;
    }
    let args = match object.get("args") {
        None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
        Some(Value::Object(map)) => Value::Object(map.clone()),
        Some(_) => return None,
    };

    Some(ToolInvocation::new(name, args))
}
