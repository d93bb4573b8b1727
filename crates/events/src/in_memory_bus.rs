//! In-memory event bus backed by a tokio broadcast channel.

use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::bus::{BusError, EventBus, Subscription};

/// Default number of undelivered messages buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// In-process pub/sub bus.
///
/// - Best-effort fan-out; slow subscribers lose the oldest messages
/// - `close()` ends every open subscription (used on shutdown)
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    sender: RwLock<Option<broadcast::Sender<M>>>,
}

impl<M: Clone> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: RwLock::new(Some(sender)),
        }
    }

    /// Drop the sender so that subscribers observe end-of-stream.
    pub fn close(&self) {
        if let Ok(mut guard) = self.sender.write() {
            guard.take();
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(broadcast::Sender::receiver_count))
            .unwrap_or(0)
    }
}

impl<M: Clone> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + Sync + 'static,
{
    type Error = BusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let guard = self.sender.read().map_err(|_| BusError::Poisoned)?;
        let sender = guard.as_ref().ok_or(BusError::Closed)?;

        // `send` only fails when nobody is subscribed, which is fine.
        let _ = sender.send(message);
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        match self.sender.read().ok().and_then(|guard| guard.as_ref().map(broadcast::Sender::subscribe)) {
            Some(rx) => Subscription::new(rx),
            None => {
                // Closed (or poisoned) bus: hand out an already-ended subscription.
                let (_tx, rx) = broadcast::channel(1);
                Subscription::new(rx)
            }
        }
    }
}
