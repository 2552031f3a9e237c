//! Error types for the real-time module.

use thiserror::Error;

/// Errors that can occur in real-time operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection limit reached for a transport.
    #[error("connection limit reached: max {0} connections")]
    ConnectionLimit(usize),

    /// The outbound queue of a connection is full.
    #[error("outbound queue full")]
    QueueFull,

    /// The connection's outbound side is gone.
    #[error("channel closed")]
    ChannelClosed,

    /// Send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
