//! Messages.

use serde::{Deserialize, Serialize};

/// Content type of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Audio,
}

impl MessageKind {
    /// Preview text used for media messages.
    pub fn media_preview(self) -> Option<&'static str> {
        match self {
            MessageKind::Text => None,
            MessageKind::Image => Some("[image]"),
            MessageKind::Audio => Some("[audio]"),
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::Image => write!(f, "image"),
            MessageKind::Audio => write!(f, "audio"),
        }
    }
}

/// A message posted to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Chat this message belongs to.
    pub chat_id: String,
    /// Sender user id.
    pub sender_id: String,
    /// Text content, or a caption for media.
    pub content: String,
    /// Whether recipients have seen the message.
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub kind: MessageKind,
    /// Blob id of attached media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,
    /// Unix timestamp of creation.
    #[serde(default)]
    pub created_at: u64,
}

impl Message {
    /// Creates an unseen text message.
    pub fn text(
        chat_id: impl Into<String>,
        sender_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            sender_id: sender_id.into(),
            content: content.into(),
            seen: false,
            kind: MessageKind::Text,
            media_id: None,
            created_at: crate::unix_now(),
        }
    }

    /// Creates an unseen media message referencing a stored blob.
    pub fn media(
        chat_id: impl Into<String>,
        sender_id: impl Into<String>,
        kind: MessageKind,
        media_id: impl Into<String>,
        caption: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            media_id: Some(media_id.into()),
            ..Self::text(chat_id, sender_id, caption)
        }
    }

    /// Preview text for chat listings and notifications.
    pub fn preview(&self) -> String {
        match self.kind.media_preview() {
            Some(label) if self.content.is_empty() => label.to_string(),
            Some(label) => format!("{} {}", label, self.content),
            None => self.content.clone(),
        }
    }
}
