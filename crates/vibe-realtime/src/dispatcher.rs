//! Single entry point for post-write notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::RealtimeConfig;
use crate::envelope::{EventEnvelope, EventKind};
use crate::push::{PublishReport, PushBroadcaster};
use crate::socket::{BroadcastReport, SocketBroadcaster};
use crate::stats::RealtimeStats;

/// Combined outcome of one dispatch across both transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub push: PublishReport,
    pub socket: BroadcastReport,
}

/// Fans a committed event out to every push subscriber and socket.
///
/// Owned by the application's composition root and shared by handle; there
/// is no process-wide instance.
#[derive(Debug)]
pub struct Dispatcher {
    push: Arc<PushBroadcaster>,
    sockets: Arc<SocketBroadcaster>,
    events_published: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher with fresh broadcasters.
    pub fn new(config: &RealtimeConfig) -> Self {
        Self::with_broadcasters(
            Arc::new(PushBroadcaster::new(config)),
            Arc::new(SocketBroadcaster::new(config)),
        )
    }

    /// Create a dispatcher over existing broadcasters.
    pub fn with_broadcasters(push: Arc<PushBroadcaster>, sockets: Arc<SocketBroadcaster>) -> Self {
        Self {
            push,
            sockets,
            events_published: AtomicU64::new(0),
        }
    }

    pub fn push(&self) -> &Arc<PushBroadcaster> {
        &self.push
    }

    pub fn sockets(&self) -> &Arc<SocketBroadcaster> {
        &self.sockets
    }

    /// Deliver an envelope to both transports.
    ///
    /// Never fails: the triggering write has already committed, so delivery
    /// problems only reduce who hears about it.
    pub fn publish_event(&self, envelope: &EventEnvelope) -> DispatchReport {
        let payload = match envelope.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, chat_id = %envelope.chat_id(), "Failed to serialize event");
                return DispatchReport::default();
            }
        };

        self.events_published.fetch_add(1, Ordering::Relaxed);

        let push = self.push.publish(&payload);
        let socket = self.sockets.broadcast(&payload);

        debug!(
            event = %envelope.kind(),
            chat_id = %envelope.chat_id(),
            message_id = %envelope.message_id(),
            push_delivered = push.delivered,
            push_dropped = push.dropped,
            socket_delivered = socket.delivered,
            socket_pruned = socket.pruned,
            "Event dispatched"
        );

        DispatchReport { push, socket }
    }

    /// Build an envelope from its fields and dispatch it.
    pub fn notify(
        &self,
        kind: EventKind,
        chat_id: &str,
        message_id: &str,
        preview: &str,
    ) -> DispatchReport {
        self.publish_event(&EventEnvelope::new(kind, chat_id, message_id, preview))
    }

    /// Close every connection on both transports.
    pub fn shutdown(&self) {
        let push = self.push.close_all();
        let sockets = self.sockets.close_all();
        debug!(push, sockets, "Realtime connections closed");
    }

    /// Current statistics.
    pub fn stats(&self) -> RealtimeStats {
        RealtimeStats {
            push_subscribers: self.push.subscriber_count(),
            socket_connections: self.sockets.connection_count(),
            total_push_subscriptions: self.push.total_subscriptions(),
            total_socket_connections: self.sockets.total_connections(),
            events_published: self.events_published.load(Ordering::Relaxed),
            push_delivered: self.push.delivered_count(),
            push_dropped: self.push.dropped_count(),
            socket_delivered: self.sockets.delivered_count(),
            sockets_pruned: self.sockets.pruned_count(),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(&RealtimeConfig::default())
    }
}
