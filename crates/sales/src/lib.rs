//! Sales orders domain module.
//!
//! Order lifecycle, numbering and totals as deterministic domain logic (no IO,
//! no HTTP, no storage). Stock checks live with the workflow that owns the
//! transaction.

pub mod number;
pub mod order;
pub mod request;
pub mod status;
pub mod totals;

pub use number::OrderNumber;
pub use order::{Order, OrderLine, OrderRevision};
pub use request::{CreateOrderRequest, OrderItemRequest, UpdateOrderRequest, UpdateStatusRequest};
pub use status::OrderStatus;
pub use totals::OrderTotals;
