//! The event bus: the single channel through which the geo engine
//! surfaces typed events to host code.

use perimeter_core::LocationEvent;
use tokio::sync::broadcast;

/// Default buffer size for subscribers that fall behind.
const DEFAULT_CAPACITY: usize = 64;

/// Broadcast channel of [`LocationEvent`]s.
///
/// Every subscriber sees every event emitted after it subscribed. Emission
/// never blocks and never fails: with no subscribers events are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LocationEvent>,
}

impl EventBus {
    /// Create a bus with the default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` events per slow subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    pub(crate) fn emit(&self, event: LocationEvent) {
        // Err means no live subscribers; fine for fire-and-forget events.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
