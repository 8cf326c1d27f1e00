//! Outbound request encoding.
//!
//! The backend takes a form-encoded POST whose `f.req` field is a JSON
//! two-element array; the second element is the real payload, JSON-encoded
//! again into a string. The payload itself is a fixed-length positional
//! array where only a handful of slots are populated.

use chrono::{DateTime, Utc};
use lariat_core::{ModelTarget, PromptFile, ReplyIds};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::decode::WireError;

/// Number of positional slots in the request payload.
const PAYLOAD_SLOTS: usize = 95;

const SLOT_PROMPT: usize = 0;
const SLOT_LOCALE: usize = 1;
const SLOT_CONTINUATION: usize = 2;
const SLOT_ROUTING_ID: usize = 3;
const SLOT_ENTITY_ID: usize = 4;
const SLOT_REQUEST_ID: usize = 59;
const SLOT_SENT_AT: usize = 66;

/// One outbound stream request, ready to encode.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Prompt text to send
    pub text: String,

    /// Attached uploads
    pub files: Vec<PromptFile>,

    /// Continuation triple; `None` starts a fresh conversation
    pub ids: Option<ReplyIds>,

    /// Backend routing ids for the selected model
    pub model: ModelTarget,

    /// UI locale, e.g. `en`
    pub locale: String,

    /// Fresh UUID identifying this request
    pub request_id: String,

    /// Send timestamp, encoded as seconds plus microseconds
    pub sent_at: DateTime<Utc>,
}

impl StreamRequest {
    pub fn new(text: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: Vec::new(),
            ids: None,
            model: ModelTarget::default(),
            locale: locale.into(),
            request_id: Uuid::new_v4().to_string(),
            sent_at: Utc::now(),
        }
    }

    pub fn with_files(mut self, files: Vec<PromptFile>) -> Self {
        self.files = files;
        self
    }

    pub fn with_ids(mut self, ids: Option<ReplyIds>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_model(mut self, model: ModelTarget) -> Self {
        self.model = model;
        self
    }

    /// The inner positional payload.
    fn payload(&self) -> Value {
        let mut slots = vec![Value::Null; PAYLOAD_SLOTS];

        let image_list = if self.files.is_empty() {
            Value::Null
        } else {
            Value::Array(
                self.files
                    .iter()
                    .map(|f| json!([[f.reference], f.name]))
                    .collect(),
            )
        };
        slots[SLOT_PROMPT] = json!([self.text, 0, null, image_list, null, null, 0]);
        slots[SLOT_LOCALE] = json!([self.locale]);
        slots[SLOT_CONTINUATION] = match &self.ids {
            Some(ids) => json!([ids.conversation_id, ids.response_id, ids.choice_id]),
            None => Value::Null,
        };
        if let Some(routing_id) = &self.model.routing_id {
            slots[SLOT_ROUTING_ID] = json!(routing_id);
        }
        if let Some(entity_id) = &self.model.entity_id {
            slots[SLOT_ENTITY_ID] = json!(entity_id);
        }
        slots[SLOT_REQUEST_ID] = json!(self.request_id);
        slots[SLOT_SENT_AT] = json!([
            self.sent_at.timestamp(),
            self.sent_at.timestamp_subsec_micros()
        ]);

        Value::Array(slots)
    }

    /// The `f.req` form-field value: `[null, <payload as a JSON string>]`.
    pub fn freq(&self) -> Result<String, WireError> {
        let inner = serde_json::to_string(&self.payload())
            .map_err(|e| WireError::Encode(e.to_string()))?;
        serde_json::to_string(&json!([Value::Null, inner]))
            .map_err(|e| WireError::Encode(e.to_string()))
    }

    /// Form pairs for the POST body. `at` carries the session auth token.
    pub fn form_pairs(&self, auth_token: &str) -> Result<Vec<(&'static str, String)>, WireError> {
        Ok(vec![
            ("f.req", self.freq()?),
            ("at", auth_token.to_string()),
        ])
    }
}
