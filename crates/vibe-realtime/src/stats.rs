//! Delivery counters.

use serde::{Deserialize, Serialize};

/// Point-in-time view of the fan-out core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeStats {
    /// Currently open push streams.
    pub push_subscribers: usize,
    /// Currently open sockets.
    pub socket_connections: usize,
    /// Push streams opened since start.
    pub total_push_subscriptions: u64,
    /// Sockets opened since start.
    pub total_socket_connections: u64,
    /// Envelopes handed to the dispatcher.
    pub events_published: u64,
    /// Events queued to push subscribers.
    pub push_delivered: u64,
    /// Events dropped because a push subscriber's queue was full.
    pub push_dropped: u64,
    /// Events handed to sockets.
    pub socket_delivered: u64,
    /// Sockets removed after a failed send.
    pub sockets_pruned: u64,
}
