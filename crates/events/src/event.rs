use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are **immutable** facts about something that already happened.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name on the wire (e.g. "newOrder").
    fn event_type(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
