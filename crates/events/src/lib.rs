//! Notification events and the publish/subscribe bus that carries them.
//!
//! Business operations publish [`Notification`]s after their unit of work has
//! committed. Delivery is best-effort: a publish failure is logged by the
//! caller and never undoes the operation.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod notification;

pub use bus::{BusError, EventBus, NoopEventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
pub use notification::{
    Audience, InventoryUpdate, LowStockAlert, NearExpiryAlert, NewOrder, Notification,
    OrderStatusChanged, StockAction,
};
