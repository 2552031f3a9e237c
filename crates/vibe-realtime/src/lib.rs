//! # Vibe Real-time
//!
//! Real-time fan-out of chat events for the Vibe chat backend.
//!
//! After a write (new message, uploaded media) commits to storage, the write
//! path builds an [`EventEnvelope`] and hands it to the [`Dispatcher`], which
//! delivers it to every live push-stream subscriber and every live socket.
//! Delivery is best-effort: nothing is retried, buffered for later, or
//! reported back to the writer.
//!
//! ## Transports
//!
//! - **Push streams** ([`PushBroadcaster`]): one bounded intake queue per
//!   subscriber. Full queues drop the event for that subscriber only. Idle
//!   streams emit a keep-alive frame every keep-alive interval (15s default).
//! - **Sockets** ([`SocketBroadcaster`]): a synchronous send per socket. The
//!   first failed send removes the socket from the active set.
//!
//! ## Example
//!
//! ```rust
//! use vibe_realtime::{Dispatcher, EventEnvelope, RealtimeConfig};
//!
//! let dispatcher = Dispatcher::new(&RealtimeConfig::default());
//! let (_socket_id, mut outbox) = dispatcher.sockets().connect_channel().unwrap();
//!
//! dispatcher.publish_event(&EventEnvelope::new_message("c1", "m1", "hi"));
//!
//! let frame = outbox.try_recv().unwrap();
//! assert!(frame.contains("\"new_message\""));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Dispatcher                  │
//! │  ┌──────────────────┐ ┌──────────────┐  │
//! │  │ PushBroadcaster  │ │   Socket     │  │
//! │  │  Registry<queue> │ │ Broadcaster  │  │
//! │  │   └─> frames     │ │ Registry<    │  │
//! │  │       (data /    │ │   sink>      │  │
//! │  │       keep-alive)│ │              │  │
//! │  └──────────────────┘ └──────────────┘  │
//! └─────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod push;
pub mod registry;
pub mod socket;
pub mod stats;

pub use config::{
    RealtimeConfig, DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_MAX_CONNECTIONS, DEFAULT_PUSH_QUEUE_CAPACITY,
    DEFAULT_SOCKET_QUEUE_CAPACITY,
};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use envelope::{EventEnvelope, EventKind, PREVIEW_MAX_CHARS};
pub use error::RealtimeError;
pub use push::{Frame, PublishReport, PushBroadcaster, PushSubscription};
pub use registry::{ConnectionState, Registry, SubscriberId};
pub use socket::{
    BroadcastReport, ChannelSink, ConnectionId, SocketBroadcaster, SocketOutbox, SocketSink,
};
pub use stats::RealtimeStats;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api() {
        let dispatcher = Dispatcher::default();
        assert_eq!(dispatcher.stats(), RealtimeStats::default());
    }

    #[tokio::test]
    async fn test_full_flow() {
        let dispatcher = Dispatcher::new(&RealtimeConfig::default());

        // Connect one client per transport
        let mut subscription = dispatcher.push().subscribe().unwrap();
        let (socket_id, mut outbox) = dispatcher.sockets().connect_channel().unwrap();

        // Publish
        dispatcher.notify(EventKind::NewMessage, "chat-1", "msg-1", "hello");

        // Both receive the same payload
        let Some(Frame::Data(pushed)) = subscription.next_frame().await else {
            panic!("expected a data frame");
        };
        let sent = outbox.recv().await.unwrap();
        assert_eq!(pushed, sent);

        // Disconnect
        drop(subscription);
        dispatcher.sockets().disconnect(socket_id);
        assert_eq!(dispatcher.stats().push_subscribers, 0);
        assert_eq!(dispatcher.stats().socket_connections, 0);
    }
}
