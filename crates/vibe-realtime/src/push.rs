//! Server-push stream broadcaster.
//!
//! Every push subscriber owns a bounded intake queue. Publishing never waits:
//! an event that does not fit in a subscriber's queue is dropped for that
//! subscriber alone. The consuming side turns the queue into a sequence of
//! frames, emitting a keep-alive comment whenever the stream stays idle for a
//! full keep-alive interval.

use futures::Stream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::config::RealtimeConfig;
use crate::error::RealtimeError;
use crate::registry::{ConnectionState, Registry, SubscriberId};

type Intake = mpsc::Sender<Arc<str>>;

/// One outbound unit of a push stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A serialized event envelope.
    Data(Arc<str>),
    /// Idle keep-alive comment.
    KeepAlive,
}

impl Frame {
    /// Render the frame in event-stream wire format.
    pub fn encode(&self) -> String {
        match self {
            Frame::Data(payload) => format!("data: {}\n\n", payload),
            Frame::KeepAlive => ": keep-alive\n\n".to_string(),
        }
    }
}

/// Outcome of a single publish across all push subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that had room for the event.
    pub delivered: usize,
    /// Subscribers whose queue was full.
    pub dropped: usize,
    /// Subscribers found closed and removed.
    pub pruned: usize,
}

/// Manages long-lived push-stream subscribers.
#[derive(Debug)]
pub struct PushBroadcaster {
    registry: Arc<Registry<Intake>>,
    keepalive_interval: Duration,
    queue_capacity: usize,
    max_subscribers: usize,
    total_subscriptions: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl PushBroadcaster {
    /// Create a broadcaster from the realtime configuration.
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            keepalive_interval: config.keepalive_interval,
            queue_capacity: config.push_queue_capacity.max(1),
            max_subscribers: config.max_connections,
            total_subscriptions: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Open a new push subscription.
    pub fn subscribe(&self) -> Result<PushSubscription, RealtimeError> {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);

        let id = self
            .registry
            .register_bounded(sender, self.max_subscribers)
            .ok_or(RealtimeError::ConnectionLimit(self.max_subscribers))?;
        self.total_subscriptions.fetch_add(1, Ordering::Relaxed);

        info!(subscriber_id = %id, "Push subscriber connected");

        Ok(PushSubscription {
            id,
            receiver,
            keepalive_interval: self.keepalive_interval,
            registry: self.registry.clone(),
            state: ConnectionState::Active,
        })
    }

    /// Queue a serialized event for every current subscriber without waiting.
    pub fn publish(&self, payload: &Arc<str>) -> PublishReport {
        let mut report = PublishReport::default();

        self.registry
            .for_each_live(|id, intake| match intake.try_send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(subscriber_id = %id, "Push queue full, event dropped");
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    if self.registry.unregister(id).is_some() {
                        debug!(subscriber_id = %id, "Closed push subscriber pruned");
                        report.pruned += 1;
                    }
                }
            });

        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.dropped.fetch_add(report.dropped as u64, Ordering::Relaxed);

        report
    }

    /// Close every subscription. Queued events are still drained by their
    /// consumers before the streams end.
    pub fn close_all(&self) -> usize {
        let closed = self.registry.drain().len();
        if closed > 0 {
            info!(count = closed, "Closed all push subscribers");
        }
        closed
    }

    /// Whether a subscription is still registered.
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.registry.contains(id)
    }

    /// Current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn total_subscriptions(&self) -> u64 {
        self.total_subscriptions.load(Ordering::Relaxed)
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer side of one push stream.
///
/// Dropping the subscription unregisters it, which is how a peer disconnect
/// propagates: the transport drops the stream and the queue goes with it.
#[derive(Debug)]
pub struct PushSubscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<str>>,
    keepalive_interval: Duration,
    registry: Arc<Registry<Intake>>,
    state: ConnectionState,
}

impl PushSubscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        if self.state.is_live() && !self.registry.contains(self.id) && self.receiver.is_empty() {
            return ConnectionState::Closed;
        }
        self.state
    }

    /// Wait for the next frame.
    ///
    /// Returns a data frame as soon as an event is queued, or a keep-alive
    /// frame after a full interval without events. Returns `None` once the
    /// broadcaster has closed the subscription.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        if self.state == ConnectionState::Closed {
            return None;
        }

        match tokio::time::timeout(self.keepalive_interval, self.receiver.recv()).await {
            Ok(Some(payload)) => Some(Frame::Data(payload)),
            Ok(None) => {
                self.close();
                None
            }
            Err(_) => Some(Frame::KeepAlive),
        }
    }

    /// Turn the subscription into a stream of frames.
    pub fn into_stream(self) -> impl Stream<Item = Frame> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            let frame = subscription.next_frame().await?;
            Some((frame, subscription))
        })
    }

    /// Unregister and stop receiving events.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state.advance(ConnectionState::Closed);
        self.registry.unregister(self.id);
        self.receiver.close();
        debug!(subscriber_id = %self.id, "Push subscriber disconnected");
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.close();
    }
}
