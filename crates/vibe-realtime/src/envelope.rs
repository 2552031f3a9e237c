//! Event envelopes handed to the dispatcher after a write.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::RealtimeError;

/// Maximum number of characters kept in an envelope preview.
pub const PREVIEW_MAX_CHARS: usize = 140;

/// Kind of chat event carried by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum EventKind {
    /// A message (text or media) was added to a chat.
    NewMessage,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::NewMessage => write!(f, "new_message"),
        }
    }
}

/// Notification payload describing a committed chat write.
///
/// Envelopes are immutable once built. They are serialized exactly once per
/// dispatch and the resulting text is shared by every recipient.
/// Decoding goes through [`EventEnvelope::new`], so previews stay bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEnvelope")]
pub struct EventEnvelope {
    /// Event kind.
    #[serde(rename = "type")]
    kind: EventKind,
    /// Chat the event belongs to.
    chat_id: String,
    /// Message that triggered the event.
    message_id: String,
    /// Short preview of the message content.
    preview: String,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: EventKind,
    chat_id: String,
    message_id: String,
    preview: String,
}

impl From<RawEnvelope> for EventEnvelope {
    fn from(raw: RawEnvelope) -> Self {
        Self::new(raw.kind, raw.chat_id, raw.message_id, raw.preview)
    }
}

impl EventEnvelope {
    /// Create a new envelope. The preview is truncated to [`PREVIEW_MAX_CHARS`].
    pub fn new(
        kind: EventKind,
        chat_id: impl Into<String>,
        message_id: impl Into<String>,
        preview: impl AsRef<str>,
    ) -> Self {
        Self {
            kind,
            chat_id: chat_id.into(),
            message_id: message_id.into(),
            preview: truncate_preview(preview.as_ref(), PREVIEW_MAX_CHARS),
        }
    }

    /// Shorthand for a `new_message` envelope.
    pub fn new_message(
        chat_id: impl Into<String>,
        message_id: impl Into<String>,
        preview: impl AsRef<str>,
    ) -> Self {
        Self::new(EventKind::NewMessage, chat_id, message_id, preview)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Serialize the envelope into the flat JSON text sent over both transports.
    pub fn to_payload(&self) -> Result<Arc<str>, RealtimeError> {
        Ok(serde_json::to_string(self)?.into())
    }
}

/// Truncate a preview on a character boundary, appending `...` when cut.
fn truncate_preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
