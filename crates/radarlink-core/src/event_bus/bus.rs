//! Event Bus implementation.
//!
//! Provides the core EventBus struct: an ordered list of synchronous
//! subscribers plus a broadcast channel mirror for async consumers.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::LinkEvent;

/// Default capacity of the broadcast channel mirror.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Type alias for event handler functions
type EventHandler = Arc<dyn Fn(LinkEvent) + Send + Sync>;

/// Event bus for one serial session
///
/// Handlers are invoked synchronously on the broadcasting task, in
/// registration order, so they must return quickly and must not panic:
/// a panicking handler aborts delivery to the handlers registered after
/// it. There is no history; late subscribers see only later events.
pub struct EventBus {
    /// Broadcast channel sender for async receivers
    sender: broadcast::Sender<LinkEvent>,
    /// Registered synchronous handlers, in registration order
    handlers: RwLock<Vec<(SubscriptionId, EventHandler)>>,
}

impl EventBus {
    /// Create a new event bus with the default channel capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with a custom channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events with a synchronous handler
    ///
    /// The handler receives [`LinkEvent::Subscribed`] exactly once,
    /// synchronously, before this method returns; events broadcast after
    /// that point are delivered in broadcast order.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(LinkEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        let handler: EventHandler = Arc::new(handler);
        self.handlers.write().push((id, handler.clone()));
        tracing::debug!("subscription {} added", id);
        handler(LinkEvent::Subscribed);
        id
    }

    /// Unsubscribe from events
    ///
    /// Removes exactly the registration identified by `id`. Returns true
    /// if it was found and removed; a second call is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(subscription, _)| *subscription != id);
        let removed = handlers.len() != before;
        if removed {
            tracing::debug!("subscription {} removed", id);
        }
        removed
    }

    /// Broadcast an event to all current subscribers
    ///
    /// Invokes every registered handler in registration order, then
    /// mirrors the event onto the broadcast channel. Returns the number
    /// of synchronous handlers invoked.
    pub fn broadcast(&self, event: LinkEvent) -> usize {
        // Snapshot outside the lock so a handler may subscribe or
        // unsubscribe re-entrantly.
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in &handlers {
            handler(event.clone());
        }

        // No receivers is not an error; sync handlers already ran.
        let _ = self.sender.send(event);

        handlers.len()
    }

    /// Get a receiver for async event consumption
    ///
    /// The receiver sees every event from this point on, in broadcast
    /// order. `Subscribed` deliveries are not mirrored; they belong to
    /// the individual synchronous subscriber.
    pub fn receiver(&self) -> broadcast::Receiver<LinkEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
