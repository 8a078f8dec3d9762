//! Inbound and outbound message types.
//!
//! The channel carries text frames. Inbound frames are decoded into
//! [`InboundMessage`]; decoding never fails, non-JSON text is wrapped as a
//! `"text"` message instead.
//!
//! # Inbound Format
//!
//! ```json
//! {
//!   "type": "notification",
//!   "data": { ... },
//!   "timestamp": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! All three fields are optional. The whole document becomes the payload.

// ============================================================================
// Imports
// ============================================================================

use std::time::SystemTime;

use serde::Serialize;
use serde_json::{Value, from_str, to_string};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Kind given to frames that are not valid JSON.
pub const KIND_TEXT: &str = "text";

/// Kind given to JSON frames without a top-level `"type"` string.
pub const KIND_JSON: &str = "json";

// ============================================================================
// InboundMessage
// ============================================================================

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Message kind: the frame's `"type"` field, [`KIND_JSON`], or [`KIND_TEXT`].
    pub kind: String,

    /// Decoded document, or the raw text as a JSON string.
    pub payload: Value,

    /// Sender-supplied `"timestamp"` field, if any.
    pub sent_at: Option<String>,

    /// Local time the frame was decoded.
    pub received_at: SystemTime,
}

impl InboundMessage {
    /// Decodes a raw text frame.
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        let received_at = SystemTime::now();

        match from_str::<Value>(raw) {
            Ok(payload) => {
                let kind = payload
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or(KIND_JSON)
                    .to_string();
                let sent_at = payload
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .map(str::to_string);

                Self {
                    kind,
                    payload,
                    sent_at,
                    received_at,
                }
            }
            Err(_) => Self::text(raw),
        }
    }

    /// Wraps raw text as a `"text"` message.
    #[must_use]
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            kind: KIND_TEXT.to_string(),
            payload: Value::String(raw.into()),
            sent_at: None,
            received_at: SystemTime::now(),
        }
    }

    /// Returns `true` if the frame was not structured data.
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == KIND_TEXT
    }

    /// Looks up a value by JSON pointer (e.g. `/ui/target`).
    #[inline]
    #[must_use]
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.payload.pointer(pointer)
    }

    /// Looks up a string by JSON pointer.
    #[inline]
    #[must_use]
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(Value::as_str)
    }

    /// Returns the `"data"` field of the payload, if present.
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.payload.get("data")
    }
}

// ============================================================================
// OutboundMessage
// ============================================================================

/// A message to send over the channel.
///
/// Structured messages are serialized to JSON text; raw text is sent as is.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Structured data, encoded as JSON.
    Json(Value),
    /// Raw text frame.
    Text(String),
}

impl OutboundMessage {
    /// Creates a structured message from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the value cannot be
    /// represented as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Encodes the message to its text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn encode(&self) -> Result<String> {
        match self {
            Self::Json(value) => Ok(to_string(value)?),
            Self::Text(text) => Ok(text.clone()),
        }
    }
}

impl From<Value> for OutboundMessage {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for OutboundMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for OutboundMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
