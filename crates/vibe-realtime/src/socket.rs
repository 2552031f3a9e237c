//! Bidirectional socket broadcaster.
//!
//! Sockets are written through a synchronous [`SocketSink`]. The first failed
//! send marks a socket dead and removes it from the active set on the spot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::config::RealtimeConfig;
use crate::error::RealtimeError;
use crate::registry::{ConnectionState, Registry, SubscriberId};

/// Identifier of an active socket connection.
pub type ConnectionId = SubscriberId;

/// Receiving end of a socket's outbound queue, drained by the writer task.
pub type SocketOutbox = mpsc::Receiver<Arc<str>>;

/// Synchronous, non-blocking send into a live socket.
pub trait SocketSink: Send + Sync + std::fmt::Debug {
    /// Hand a text frame to the socket. Any error means the socket is dead.
    fn send_text(&self, payload: &Arc<str>) -> Result<(), RealtimeError>;
}

/// Sink backed by a bounded queue that a writer task forwards to the socket.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<Arc<str>>,
}

impl ChannelSink {
    /// Create a sink and the outbox its writer task reads from.
    pub fn pair(capacity: usize) -> (Self, SocketOutbox) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl SocketSink for ChannelSink {
    fn send_text(&self, payload: &Arc<str>) -> Result<(), RealtimeError> {
        self.sender.try_send(payload.clone()).map_err(|e| match e {
            TrySendError::Full(_) => RealtimeError::QueueFull,
            TrySendError::Closed(_) => RealtimeError::ChannelClosed,
        })
    }
}

/// Outcome of a broadcast across all active sockets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sockets that accepted the frame.
    pub delivered: usize,
    /// Sockets that failed and were removed.
    pub pruned: usize,
}

/// Manages the set of active socket connections.
#[derive(Debug)]
pub struct SocketBroadcaster {
    registry: Registry<Arc<dyn SocketSink>>,
    queue_capacity: usize,
    max_connections: usize,
    total_connections: AtomicU64,
    delivered: AtomicU64,
    pruned: AtomicU64,
}

impl SocketBroadcaster {
    /// Create a broadcaster from the realtime configuration.
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            registry: Registry::new(),
            queue_capacity: config.socket_queue_capacity.max(1),
            max_connections: config.max_connections,
            total_connections: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
        }
    }

    /// Add an accepted socket to the active set.
    pub fn connect(&self, sink: Arc<dyn SocketSink>) -> Result<ConnectionId, RealtimeError> {
        let id = self
            .registry
            .register_bounded(sink, self.max_connections)
            .ok_or(RealtimeError::ConnectionLimit(self.max_connections))?;
        self.total_connections.fetch_add(1, Ordering::Relaxed);

        info!(connection_id = %id, "Socket connected");
        Ok(id)
    }

    /// Add a socket served by a writer task draining the returned outbox.
    pub fn connect_channel(&self) -> Result<(ConnectionId, SocketOutbox), RealtimeError> {
        let (sink, outbox) = ChannelSink::pair(self.queue_capacity);
        let id = self.connect(Arc::new(sink))?;
        Ok((id, outbox))
    }

    /// Remove a socket. Returns false if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.registry.unregister(id).is_some();
        if removed {
            info!(connection_id = %id, "Socket disconnected");
        }
        removed
    }

    /// Send a text frame to every active socket, pruning the ones that fail.
    pub fn broadcast(&self, payload: &Arc<str>) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        self.registry
            .for_each_live(|id, sink| match sink.send_text(payload) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    if self.registry.unregister(id).is_some() {
                        debug!(connection_id = %id, error = %e, "Dead socket pruned");
                        report.pruned += 1;
                    }
                }
            });

        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.pruned.fetch_add(report.pruned as u64, Ordering::Relaxed);

        report
    }

    /// Drop every socket from the active set.
    pub fn close_all(&self) -> usize {
        let closed = self.registry.drain().len();
        if closed > 0 {
            info!(count = closed, "Closed all sockets");
        }
        closed
    }

    /// Lifecycle state of a socket as seen by the broadcaster.
    pub fn state(&self, id: ConnectionId) -> ConnectionState {
        if self.registry.contains(id) {
            ConnectionState::Active
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.registry.contains(id)
    }

    /// Current number of active sockets.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn pruned_count(&self) -> u64 {
        self.pruned.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    /// Sink that records attempts and fails on demand.
    #[derive(Debug, Default)]
    struct FlakySink {
        failing: AtomicBool,
        attempts: AtomicUsize,
    }

    impl SocketSink for FlakySink {
        fn send_text(&self, _payload: &Arc<str>) -> Result<(), RealtimeError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(RealtimeError::SendFailed("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn payload(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn test_connect_and_disconnect() {
        let sockets = SocketBroadcaster::new(&RealtimeConfig::default());
        let id = sockets.connect(Arc::new(FlakySink::default())).unwrap();

        assert_eq!(sockets.connection_count(), 1);
        assert_eq!(sockets.state(id), ConnectionState::Active);

        assert!(sockets.disconnect(id));
        assert!(!sockets.disconnect(id));
        assert_eq!(sockets.state(id), ConnectionState::Closed);
    }

    #[test]
    fn test_failed_socket_is_pruned_and_not_retried() {
        let sockets = SocketBroadcaster::new(&RealtimeConfig::default());
        let dead = Arc::new(FlakySink::default());
        let healthy = Arc::new(FlakySink::default());
        let dead_id = sockets.connect(dead.clone()).unwrap();
        sockets.connect(healthy.clone()).unwrap();

        dead.failing.store(true, Ordering::SeqCst);
        let report = sockets.broadcast(&payload("first"));
        assert_eq!(report, BroadcastReport { delivered: 1, pruned: 1 });
        assert!(!sockets.is_connected(dead_id));

        let report = sockets.broadcast(&payload("second"));
        assert_eq!(report, BroadcastReport { delivered: 1, pruned: 0 });
        assert_eq!(dead.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(sockets.pruned_count(), 1);
    }

    #[test]
    fn test_channel_socket_receives_broadcast() {
        let sockets = SocketBroadcaster::new(&RealtimeConfig::default());
        let (_id, mut outbox) = sockets.connect_channel().unwrap();

        sockets.broadcast(&payload("hello"));
        assert_eq!(outbox.try_recv().unwrap(), payload("hello"));
    }

    #[test]
    fn test_closed_outbox_prunes_socket() {
        let sockets = SocketBroadcaster::new(&RealtimeConfig::default());
        let (id, outbox) = sockets.connect_channel().unwrap();
        drop(outbox);

        let report = sockets.broadcast(&payload("hello"));
        assert_eq!(report.pruned, 1);
        assert!(!sockets.is_connected(id));
    }

    #[test]
    fn test_full_outbox_prunes_socket() {
        let sockets = SocketBroadcaster::new(&RealtimeConfig {
            socket_queue_capacity: 1,
            ..RealtimeConfig::default()
        });
        let (id, mut outbox) = sockets.connect_channel().unwrap();

        assert_eq!(sockets.broadcast(&payload("one")).delivered, 1);
        assert_eq!(sockets.broadcast(&payload("two")).pruned, 1);
        assert!(!sockets.is_connected(id));

        // The writer still drains what was queued, then sees the end.
        assert_eq!(outbox.try_recv().unwrap(), payload("one"));
        assert!(outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_all_ends_outboxes() {
        let sockets = SocketBroadcaster::new(&RealtimeConfig::default());
        let (_a, mut outbox_a) = sockets.connect_channel().unwrap();
        let (_b, mut outbox_b) = sockets.connect_channel().unwrap();

        assert_eq!(sockets.close_all(), 2);
        assert!(outbox_a.recv().await.is_none());
        assert!(outbox_b.recv().await.is_none());
        assert_eq!(sockets.connection_count(), 0);
    }

    #[test]
    fn test_connection_limit() {
        let sockets = SocketBroadcaster::new(&RealtimeConfig {
            max_connections: 1,
            ..RealtimeConfig::default()
        });

        sockets.connect_channel().unwrap();
        assert!(matches!(
            sockets.connect_channel(),
            Err(RealtimeError::ConnectionLimit(1))
        ));
    }
}
