//! # Lariat Wire
//!
//! Codec for the backend's undocumented wire protocol.
//!
//! The response side is a newline-delimited stream of JSON arrays where the
//! interesting lines wrap a **JSON-encoded string** payload (two decodes per
//! line) and every payload carries the full reply so far, not a delta. The
//! request side is a form-encoded POST whose `f.req` field wraps a 95-slot
//! positional array, JSON-encoded twice the same way.
//!
//! [`StreamDecoder`] handles line buffering and the outer envelope;
//! [`decode::decode_payload`] handles the inner payload shape on its own so
//! upstream format drift stays contained.

pub mod decode;
pub mod envelope;

pub use decode::{decode_payload, StreamDecoder, WireError};
pub use envelope::StreamRequest;
