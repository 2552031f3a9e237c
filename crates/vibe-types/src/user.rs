//! Users.

use serde::{Deserialize, Serialize};

/// Status shown for users who never set one.
pub const DEFAULT_STATUS: &str = "Hey there! I am using Vibe Chat.";

/// A chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique username used to log in.
    pub username: String,
    /// Name shown in conversations.
    pub display_name: String,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Status message.
    #[serde(default = "default_status")]
    pub status: Option<String>,
}

fn default_status() -> Option<String> {
    Some(DEFAULT_STATUS.to_string())
}

impl User {
    /// Creates a user with the default status.
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            avatar: None,
            status: default_status(),
        }
    }

    /// Sets the avatar URL.
    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults() {
        let user = User::new("alice", "Alice");
        assert_eq!(user.status.as_deref(), Some(DEFAULT_STATUS));
        assert!(user.avatar.is_none());
    }

    #[test]
    fn test_missing_status_gets_default() {
        let user: User =
            serde_json::from_str(r#"{"username":"bob","display_name":"Bob"}"#).unwrap();
        assert_eq!(user.status.as_deref(), Some(DEFAULT_STATUS));
    }
}
