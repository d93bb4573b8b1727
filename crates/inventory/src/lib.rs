//! Inventory domain module: stock batches (lots) with expiry tracking.
//!
//! Deterministic domain logic only (no IO, no HTTP, no storage).

pub mod batch;
pub mod ledger;

pub use batch::{Batch, BatchPatch, DEFAULT_NEAR_EXPIRY_DAYS, ExpiryUrgency, NewBatch, normalize_batch_no};
pub use ledger::total_quantity;
