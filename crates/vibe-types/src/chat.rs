//! Chats.

use serde::{Deserialize, Serialize};

/// A conversation between two or more users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Participant user ids.
    pub participants: Vec<String>,
    /// Preview of the latest message.
    #[serde(default)]
    pub last_message_preview: Option<String>,
}

impl Chat {
    /// Minimum number of participants in a chat.
    pub const MIN_PARTICIPANTS: usize = 2;

    /// Creates a chat with no messages yet.
    pub fn new(participants: Vec<String>) -> Self {
        Self {
            participants,
            last_message_preview: None,
        }
    }

    /// Checks whether a user takes part in this chat.
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }
}
