//! Tuning knobs for the fan-out core.

use std::time::Duration;

/// Idle interval after which a push stream emits a keep-alive frame.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Default bound of each push subscriber's intake queue.
pub const DEFAULT_PUSH_QUEUE_CAPACITY: usize = 256;

/// Default bound of each socket's outbound queue.
pub const DEFAULT_SOCKET_QUEUE_CAPACITY: usize = 256;

/// Maximum number of concurrent connections per transport.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

/// Configuration for the push-stream and socket broadcasters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Keep-alive interval for idle push streams.
    pub keepalive_interval: Duration,
    /// Intake queue bound per push subscriber. Events beyond it are dropped
    /// for that subscriber only.
    pub push_queue_capacity: usize,
    /// Outbound queue bound per socket. A socket whose queue is full is
    /// treated as dead.
    pub socket_queue_capacity: usize,
    /// Connection limit, applied to each transport separately.
    pub max_connections: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            push_queue_capacity: DEFAULT_PUSH_QUEUE_CAPACITY,
            socket_queue_capacity: DEFAULT_SOCKET_QUEUE_CAPACITY,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}
