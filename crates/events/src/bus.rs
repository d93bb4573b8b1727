//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is a **lossy broadcast**: every live subscriber receives a copy of
//! each message published after it subscribed. A subscriber that falls too
//! far behind skips the oldest messages instead of stalling publishers.
//! Nothing is persisted; the document store is the source of truth and
//! notifications are a convenience for connected clients.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus was shut down; no further messages are accepted.
    #[error("event bus closed")]
    Closed,

    /// Internal lock poisoning.
    #[error("event bus lock poisoned")]
    Poisoned,
}

/// A subscription to an event stream.
///
/// ```ignore
/// let mut subscription = bus.subscribe();
/// while let Some(event) = subscription.recv().await {
///     forward(event);
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: broadcast::Receiver<M>,
}

impl<M: Clone> Subscription<M> {
    pub fn new(receiver: broadcast::Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message. Returns `None` once the bus is closed.
    ///
    /// Messages dropped because this subscriber lagged are skipped.
    pub async fn recv(&mut self) -> Option<M> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber lagged; dropping oldest notifications");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<M> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Unwrap into the raw receiver (e.g. to adapt into a `Stream`).
    pub fn into_inner(self) -> broadcast::Receiver<M> {
        self.receiver
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish` is synchronous and never waits on subscribers. Publishing with
/// no subscribers is not an error.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}

/// A bus that drops everything. Subscriptions end immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventBus;

impl<M> EventBus<M> for NoopEventBus
where
    M: Clone + Send + 'static,
{
    type Error = BusError;

    fn publish(&self, _message: M) -> Result<(), Self::Error> {
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (_tx, rx) = broadcast::channel(1);
        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_bus_accepts_and_closes() {
        let bus = NoopEventBus;
        assert!(EventBus::<u32>::publish(&bus, 7).is_ok());

        let mut sub: Subscription<u32> = bus.subscribe();
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_newest() {
        let (tx, rx) = broadcast::channel(2);
        let mut sub = Subscription::new(rx);
        for i in 0..5u32 {
            tx.send(i).unwrap();
        }
        assert_eq!(sub.recv().await, Some(3));
        assert_eq!(sub.try_recv(), Some(4));
        assert_eq!(sub.try_recv(), None);
    }
}
