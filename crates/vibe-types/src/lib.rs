//! Common types used throughout `vibe`.
//!
//! Each type is one document collection in the backing store. The collection
//! name is the lowercase type name.

mod chat;
mod message;
mod user;

pub use chat::Chat;
pub use message::{Message, MessageKind};
pub use user::{User, DEFAULT_STATUS};

/// Collection names.
pub mod collections {
    pub const USER: &str = "user";
    pub const CHAT: &str = "chat";
    pub const MESSAGE: &str = "message";
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
